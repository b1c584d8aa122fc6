//! Interfaces the services depend on. Adapters live in the `postgres` and
//! `external_services` crates; [`crate::memory`] provides an in-process store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::*;
use crate::error::{ExternalServiceError, HashingError, RepositoryError};

/// Persistence for campgrounds
#[async_trait]
pub trait CampgroundRepository: Send + Sync {
    /// Every campground in storage order
    async fn find_all(&self) -> Result<Vec<Campground>, RepositoryError>;

    /// A single campground without relations
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError>;

    /// A campground with its author, reviews and review authors resolved
    async fn find_by_id_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError>;

    /// Up to `limit` campgrounds in storage order
    async fn find_many(&self, limit: usize) -> Result<Vec<Campground>, RepositoryError>;

    /// Persists a new campground with an empty review list
    async fn create(&self, campground: NewCampground) -> Result<Campground, RepositoryError>;

    /// Applies scalar changes, returning `None` if the campground does not exist
    async fn update(
        &self,
        id: Uuid,
        changes: &CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError>;

    /// Appends images in order
    async fn add_images(
        &self,
        id: Uuid,
        images: &[Image],
    ) -> Result<Option<Campground>, RepositoryError>;

    /// Removes every image whose filename is listed
    async fn remove_images(
        &self,
        id: Uuid,
        filenames: &[String],
    ) -> Result<Option<Campground>, RepositoryError>;

    /// Atomically appends a review id to the campground's review list
    async fn push_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError>;

    /// Atomically removes a review id from the campground's review list
    async fn pull_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError>;

    /// Removes the campground, returning the deleted record
    async fn delete(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError>;

    /// Number of stored campgrounds
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Persistence for reviews
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// A single review without relations
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError>;

    /// A review with its author resolved
    async fn find_by_id_with_author(
        &self,
        id: Uuid,
    ) -> Result<Option<ReviewDetails>, RepositoryError>;

    /// Persists a new review
    async fn create(&self, review: NewReview) -> Result<Review, RepositoryError>;

    /// Removes a review, returning `true` if it existed
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Removes all listed reviews, returning how many existed
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, RepositoryError>;

    /// Number of stored reviews
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Persistence for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks a user up by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Looks a user up by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Looks a user up by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Persists a new user. Fails with [`RepositoryError::Duplicate`] on a taken email or username.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Number of registered users
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    /// Produces an opaque salted hash of `password`
    fn hash(&self, password: &str) -> Result<String, HashingError>;

    /// Checks `password` against a hash produced by [`PasswordHasher::hash`]
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashingError>;
}

/// Forward geocoding of free-text addresses
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `query` to a point, or `None` if nothing matched
    async fn forward_geocode(&self, query: &str) -> Result<Option<Geometry>, ExternalServiceError>;
}

/// A file received from the client, not yet stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Name the client gave the file
    pub original_name: String,
    /// MIME type, e.g. `image/jpeg`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// External image storage
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the file and returns where it can be fetched from
    async fn upload(&self, file: ImageUpload) -> Result<Image, ExternalServiceError>;

    /// Deletes the stored image with the given filename
    async fn delete(&self, filename: &str) -> Result<(), ExternalServiceError>;
}

/// Liveness check for the backing store
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Returns `true` if the store answered
    async fn ping(&self) -> bool;
}
