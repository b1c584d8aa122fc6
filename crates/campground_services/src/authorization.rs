//! Ownership checks for mutating campgrounds and reviews.
//!
//! A check resolves the target by id, then compares its author with the
//! caller. Absence wins over ownership: a missing resource is reported as
//! not found even to anonymous callers.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::entities::{Campground, Owned, Review};
use crate::error::RepositoryError;
use crate::ports::{CampgroundRepository, ReviewRepository};

/// Why an ownership check rejected the caller
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The resource id did not resolve
    #[error("Cannot find that {0}!")]
    NotFound(&'static str),

    /// The caller is anonymous or not the author
    #[error("You do not have permission to do that!")]
    Forbidden,

    /// Resolving the resource failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Decides access for an already-resolved resource
pub fn authorize<T: Owned>(
    resource: Option<T>,
    principal: Option<Uuid>,
    kind: &'static str,
) -> Result<T, AccessError> {
    let resource = resource.ok_or(AccessError::NotFound(kind))?;

    match principal {
        Some(user_id) if user_id == resource.author_id() => Ok(resource),
        _ => Err(AccessError::Forbidden),
    }
}

/// Resolves resources through the repositories and checks their author
#[derive(Clone)]
pub struct OwnershipGuard {
    campgrounds: Arc<dyn CampgroundRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl OwnershipGuard {
    /// Creates a guard over the given repositories
    pub fn new(
        campgrounds: Arc<dyn CampgroundRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            campgrounds,
            reviews,
        }
    }

    /// Returns the campground if `principal` authored it
    pub async fn campground(
        &self,
        id: Uuid,
        principal: Option<Uuid>,
    ) -> Result<Campground, AccessError> {
        let campground = self.campgrounds.find_by_id(id).await?;
        let result = authorize(campground, principal, "campground");
        if let Err(AccessError::Forbidden) = &result {
            debug!("Rejected campground {} for {:?}", id, principal);
        }
        result
    }

    /// Returns the review if `principal` authored it
    pub async fn review(&self, id: Uuid, principal: Option<Uuid>) -> Result<Review, AccessError> {
        let review = self.reviews.find_by_id(id).await?;
        let result = authorize(review, principal, "review");
        if let Err(AccessError::Forbidden) = &result {
            debug!("Rejected review {} for {:?}", id, principal);
        }
        result
    }
}
