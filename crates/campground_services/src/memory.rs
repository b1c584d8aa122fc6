//! In-process store implementing every repository port. Used by tests and
//! for running the API without a database.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::entities::*;
use crate::error::RepositoryError;
use crate::ports::{CampgroundRepository, ReviewRepository, StoreHealth, UserRepository};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    campgrounds: Vec<Campground>,
    reviews: Vec<Review>,
}

impl Collections {
    fn author(&self, id: Uuid) -> Option<Author> {
        self.users.iter().find(|u| u.id == id).map(Author::from)
    }

    fn review_details(&self, review: &Review) -> ReviewDetails {
        ReviewDetails {
            review: review.clone(),
            author: self.author(review.author_id),
        }
    }

    fn campground_mut(&mut self, id: Uuid) -> Option<&mut Campground> {
        self.campgrounds.iter_mut().find(|c| c.id == id)
    }
}

/// Insertion-ordered in-memory store
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<Collections>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampgroundRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Campground>, RepositoryError> {
        Ok(self.data.read().await.campgrounds.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.campgrounds.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_id_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError> {
        let data = self.data.read().await;
        let Some(campground) = data.campgrounds.iter().find(|c| c.id == id) else {
            return Ok(None);
        };

        // dangling review ids are dropped, as a populate would
        let reviews = campground
            .review_ids
            .iter()
            .filter_map(|review_id| data.reviews.iter().find(|r| r.id == *review_id))
            .map(|review| data.review_details(review))
            .collect();

        Ok(Some(CampgroundDetails {
            campground: campground.clone(),
            author: data.author(campground.author_id),
            reviews,
        }))
    }

    async fn find_many(&self, limit: usize) -> Result<Vec<Campground>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.campgrounds.iter().take(limit).cloned().collect())
    }

    async fn create(&self, campground: NewCampground) -> Result<Campground, RepositoryError> {
        let now = Utc::now();
        let campground = Campground {
            id: Uuid::new_v4(),
            title: campground.title,
            description: campground.description,
            location: campground.location,
            geometry: campground.geometry,
            price: campground.price,
            images: campground.images,
            author_id: campground.author_id,
            review_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.campgrounds.push(campground.clone());
        debug!("Created campground {} with id {}", campground.title, campground.id);
        Ok(campground)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        let Some(campground) = data.campground_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            campground.title = title.clone();
        }
        if let Some(description) = &changes.description {
            campground.description = description.clone();
        }
        if let Some(location) = &changes.location {
            campground.location = location.clone();
        }
        if let Some(geometry) = changes.geometry {
            campground.geometry = geometry;
        }
        if let Some(price) = changes.price {
            campground.price = price;
        }
        campground.updated_at = Utc::now();

        Ok(Some(campground.clone()))
    }

    async fn add_images(
        &self,
        id: Uuid,
        images: &[Image],
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.campground_mut(id).map(|campground| {
            campground.images.extend_from_slice(images);
            campground.updated_at = Utc::now();
            campground.clone()
        }))
    }

    async fn remove_images(
        &self,
        id: Uuid,
        filenames: &[String],
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.campground_mut(id).map(|campground| {
            campground
                .images
                .retain(|image| !filenames.contains(&image.filename));
            campground.updated_at = Utc::now();
            campground.clone()
        }))
    }

    async fn push_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.campground_mut(id).map(|campground| {
            campground.review_ids.push(review_id);
            campground.clone()
        }))
    }

    async fn pull_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.campground_mut(id).map(|campground| {
            campground.review_ids.retain(|existing| *existing != review_id);
            campground.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.data.write().await;
        let position = data.campgrounds.iter().position(|c| c.id == id);
        Ok(position.map(|index| data.campgrounds.remove(index)))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.data.read().await.campgrounds.len() as u64)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_id_with_author(
        &self,
        id: Uuid,
    ) -> Result<Option<ReviewDetails>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .reviews
            .iter()
            .find(|r| r.id == id)
            .map(|review| data.review_details(review)))
    }

    async fn create(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            body: review.body,
            rating: review.rating,
            author_id: review.author_id,
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.reviews.push(review.clone());
        Ok(review)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| r.id != id);
        Ok(data.reviews.len() < before)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| !ids.contains(&r.id));
        Ok((before - data.reviews.len()) as u64)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.data.read().await.reviews.len() as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;

        if data
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Duplicate {
                field: "email".to_string(),
            });
        }
        if data.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate {
                field: "username".to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.data.read().await.users.len() as u64)
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_campground(author_id: Uuid, title: &str) -> NewCampground {
        NewCampground {
            title: title.to_string(),
            description: "D".to_string(),
            location: "L".to_string(),
            geometry: Geometry::point(1.0, 2.0),
            price: 10.0,
            images: vec![Image::new("https://cdn/upload/a.jpg", "a")],
            author_id,
        }
    }

    #[tokio::test]
    async fn test_relations_are_resolved_in_review_order() {
        let store = InMemoryStore::new();
        let user = UserRepository::create(
            &store,
            NewUser {
                email: "a@x.com".to_string(),
                username: "a".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        let campground = CampgroundRepository::create(&store, new_campground(user.id, "T"))
            .await
            .unwrap();

        for body in ["first", "second"] {
            let review = ReviewRepository::create(
                &store,
                NewReview {
                    body: body.to_string(),
                    rating: 4,
                    author_id: user.id,
                },
            )
            .await
            .unwrap();
            store.push_review(campground.id, review.id).await.unwrap();
        }
        // a dangling id must not surface
        store.push_review(campground.id, Uuid::new_v4()).await.unwrap();

        let details = store
            .find_by_id_with_relations(campground.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.author.unwrap().username, "a");
        let bodies: Vec<_> = details.reviews.iter().map(|r| r.review.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
        assert_eq!(details.reviews[0].author.as_ref().unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_images_are_appended_then_removed_by_filename() {
        let store = InMemoryStore::new();
        let campground = CampgroundRepository::create(&store, new_campground(Uuid::new_v4(), "T"))
            .await
            .unwrap();

        store
            .add_images(campground.id, &[Image::new("https://cdn/upload/b.jpg", "b")])
            .await
            .unwrap();
        let updated = store
            .remove_images(campground.id, &["a".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.images, vec![Image::new("https://cdn/upload/b.jpg", "b")]);
        assert!(store.add_images(Uuid::new_v4(), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_many_keeps_insertion_order() {
        let store = InMemoryStore::new();
        let author = Uuid::new_v4();
        for title in ["one", "two", "three"] {
            CampgroundRepository::create(&store, new_campground(author, title))
                .await
                .unwrap();
        }

        let titles: Vec<_> = store
            .find_many(2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_duplicate_users_are_rejected() {
        let store = InMemoryStore::new();
        let user = |email: &str, username: &str| NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        };

        UserRepository::create(&store, user("a@x.com", "a")).await.unwrap();

        let email = UserRepository::create(&store, user("A@X.COM", "b")).await;
        assert!(matches!(email, Err(RepositoryError::Duplicate { field }) if field == "email"));

        let username = UserRepository::create(&store, user("b@x.com", "a")).await;
        assert!(matches!(username, Err(RepositoryError::Duplicate { field }) if field == "username"));

        assert_eq!(UserRepository::count(&store).await.unwrap(), 1);
    }
}
