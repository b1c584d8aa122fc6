use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entities::*;
use crate::error::ServiceError;
use crate::ports::{CampgroundRepository, ReviewRepository};
use crate::validation::ReviewInput;

/// Review use cases. Keeps every campground's review list in step with the
/// stored reviews.
#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    campgrounds: Arc<dyn CampgroundRepository>,
}

impl ReviewService {
    /// Creates a service over the given repositories
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        campgrounds: Arc<dyn CampgroundRepository>,
    ) -> Self {
        Self {
            reviews,
            campgrounds,
        }
    }

    /// Creates a review on an existing campground.
    ///
    /// Returns `None` without writing anything if the campground does not
    /// exist. If attaching the new review to the campground fails, the review
    /// is deleted again before the error is returned.
    pub async fn create(
        &self,
        campground_id: Uuid,
        input: ReviewInput,
        author_id: Uuid,
    ) -> Result<Option<Review>, ServiceError> {
        if self.campgrounds.find_by_id(campground_id).await?.is_none() {
            return Ok(None);
        }

        let review = self
            .reviews
            .create(NewReview {
                body: input.body,
                rating: input.rating,
                author_id,
            })
            .await?;

        match self.campgrounds.push_review(campground_id, review.id).await {
            Ok(Some(_)) => {
                info!("Review {} added to campground {}", review.id, campground_id);
                Ok(Some(review))
            }
            Ok(None) => {
                warn!(
                    "Campground {} disappeared while review {} was being added",
                    campground_id, review.id
                );
                self.discard(review.id).await?;
                Ok(None)
            }
            Err(e) => {
                error!(
                    "Failed to attach review {} to campground {}: {}",
                    review.id, campground_id, e
                );
                self.discard(review.id).await?;
                Err(e.into())
            }
        }
    }

    async fn discard(&self, review_id: Uuid) -> Result<(), ServiceError> {
        self.reviews.delete(review_id).await.map(|_| ()).map_err(|e| {
            error!("Review {} is orphaned: {}", review_id, e);
            ServiceError::Inconsistent(format!(
                "review {review_id} was created but could not be attached or removed"
            ))
        })
    }

    /// Detaches the review from the campground and deletes it.
    ///
    /// Returns `false` without writing anything unless the campground exists
    /// and lists the review, so a review is never removed from under a
    /// campground other than the one named.
    pub async fn delete(&self, campground_id: Uuid, review_id: Uuid) -> Result<bool, ServiceError> {
        let listed = self
            .campgrounds
            .find_by_id(campground_id)
            .await?
            .is_some_and(|c| c.review_ids.contains(&review_id));
        if !listed {
            debug!("Review {} is not listed on campground {}", review_id, campground_id);
            return Ok(false);
        }

        self.campgrounds.pull_review(campground_id, review_id).await?;
        let existed = self.reviews.delete(review_id).await?;

        if existed {
            info!("Review {} deleted from campground {}", review_id, campground_id);
        }
        Ok(existed)
    }

    /// A review with its author resolved
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ReviewDetails>, ServiceError> {
        Ok(self.reviews.find_by_id_with_author(id).await?)
    }

    /// Number of stored reviews
    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.reviews.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::memory::InMemoryStore;
    use crate::ports::UserRepository;
    use crate::services::CampgroundService;
    use crate::validation::CampgroundInput;
    use async_trait::async_trait;

    struct Fixture {
        store: Arc<InMemoryStore>,
        campgrounds: CampgroundService,
        reviews: ReviewService,
        user: User,
        campground: Campground,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let campgrounds = CampgroundService::new(store.clone(), store.clone());
        let reviews = ReviewService::new(store.clone(), store.clone());

        let user = UserRepository::create(
            store.as_ref(),
            NewUser {
                email: "a@x.com".to_string(),
                username: "a".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        let campground = campgrounds
            .create(
                CampgroundInput {
                    title: "T".to_string(),
                    price: 10.0,
                    location: "L".to_string(),
                    description: "D".to_string(),
                },
                Vec::new(),
                Geometry::point(1.0, 2.0),
                user.id,
            )
            .await
            .unwrap();

        Fixture {
            store,
            campgrounds,
            reviews,
            user,
            campground,
        }
    }

    fn nice() -> ReviewInput {
        ReviewInput {
            body: "nice".to_string(),
            rating: 5,
        }
    }

    #[tokio::test]
    async fn test_create_appends_exactly_one_id() {
        let f = fixture().await;

        let review = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();

        let details = f.campgrounds.get_by_id(f.campground.id).await.unwrap().unwrap();
        assert_eq!(details.campground.review_ids, vec![review.id]);
        assert_eq!(details.reviews.len(), 1);
        assert_eq!(details.reviews[0].review.body, "nice");
        assert_eq!(details.reviews[0].author.as_ref().unwrap().username, "a");
    }

    #[tokio::test]
    async fn test_create_on_missing_campground_writes_nothing() {
        let f = fixture().await;

        let created = f.reviews.create(Uuid::new_v4(), nice(), f.user.id).await.unwrap();
        assert!(created.is_none());
        assert_eq!(f.reviews.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_detaches_and_removes() {
        let f = fixture().await;
        let review = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();

        assert!(f.reviews.delete(f.campground.id, review.id).await.unwrap());

        let details = f.campgrounds.get_by_id(f.campground.id).await.unwrap().unwrap();
        assert!(details.reviews.is_empty());
        assert!(details.campground.review_ids.is_empty());
        assert!(f.reviews.get_by_id(review.id).await.unwrap().is_none());

        // second delete is a no-op
        assert!(!f.reviews.delete(f.campground.id, review.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_through_another_campground_changes_nothing() {
        let f = fixture().await;
        let review = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();
        let other = f
            .campgrounds
            .create(
                CampgroundInput {
                    title: "Other".to_string(),
                    price: 5.0,
                    location: "Elsewhere".to_string(),
                    description: "D".to_string(),
                },
                Vec::new(),
                Geometry::point(3.0, 4.0),
                f.user.id,
            )
            .await
            .unwrap();

        assert!(!f.reviews.delete(other.id, review.id).await.unwrap());
        assert!(!f.reviews.delete(Uuid::new_v4(), review.id).await.unwrap());

        let details = f.campgrounds.get_by_id(f.campground.id).await.unwrap().unwrap();
        assert_eq!(details.campground.review_ids, vec![review.id]);
        assert_eq!(details.reviews.len(), 1);
        assert_eq!(f.reviews.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_resolves_author() {
        let f = fixture().await;
        let review = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();

        let details = f.reviews.get_by_id(review.id).await.unwrap().unwrap();
        assert_eq!(details.review.rating, 5);
        assert_eq!(details.author.unwrap().id, f.user.id);
    }

    #[tokio::test]
    async fn test_campground_scenario_end_to_end() {
        let f = fixture().await;

        let all = f.campgrounds.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "T");

        let review = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();
        let details = f.campgrounds.get_by_id(f.campground.id).await.unwrap().unwrap();
        assert_eq!(details.reviews.len(), 1);

        f.reviews.delete(f.campground.id, review.id).await.unwrap();
        let details = f.campgrounds.get_by_id(f.campground.id).await.unwrap().unwrap();
        assert_eq!(details.reviews.len(), 0);

        let second = f
            .reviews
            .create(f.campground.id, nice(), f.user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(f.campgrounds.delete(f.campground.id).await.unwrap());
        assert!(f.campgrounds.get_by_id(f.campground.id).await.unwrap().is_none());
        assert!(f.reviews.get_by_id(second.id).await.unwrap().is_none());
        assert_eq!(f.reviews.count().await.unwrap(), 0);
    }

    /// Delegates to the in-memory store except for attaching reviews, which
    /// either fails or finds the campground gone
    struct FailingAttach {
        store: Arc<InMemoryStore>,
        vanished: bool,
    }

    #[async_trait]
    impl CampgroundRepository for FailingAttach {
        async fn find_all(&self) -> Result<Vec<Campground>, RepositoryError> {
            self.store.find_all().await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
            CampgroundRepository::find_by_id(self.store.as_ref(), id).await
        }
        async fn find_by_id_with_relations(
            &self,
            id: Uuid,
        ) -> Result<Option<CampgroundDetails>, RepositoryError> {
            self.store.find_by_id_with_relations(id).await
        }
        async fn find_many(&self, limit: usize) -> Result<Vec<Campground>, RepositoryError> {
            self.store.find_many(limit).await
        }
        async fn create(&self, campground: NewCampground) -> Result<Campground, RepositoryError> {
            CampgroundRepository::create(self.store.as_ref(), campground).await
        }
        async fn update(
            &self,
            id: Uuid,
            changes: &CampgroundChanges,
        ) -> Result<Option<Campground>, RepositoryError> {
            self.store.update(id, changes).await
        }
        async fn add_images(
            &self,
            id: Uuid,
            images: &[Image],
        ) -> Result<Option<Campground>, RepositoryError> {
            self.store.add_images(id, images).await
        }
        async fn remove_images(
            &self,
            id: Uuid,
            filenames: &[String],
        ) -> Result<Option<Campground>, RepositoryError> {
            self.store.remove_images(id, filenames).await
        }
        async fn push_review(
            &self,
            _id: Uuid,
            _review_id: Uuid,
        ) -> Result<Option<Campground>, RepositoryError> {
            if self.vanished {
                Ok(None)
            } else {
                Err(RepositoryError::Backend("connection reset".to_string()))
            }
        }
        async fn pull_review(
            &self,
            id: Uuid,
            review_id: Uuid,
        ) -> Result<Option<Campground>, RepositoryError> {
            self.store.pull_review(id, review_id).await
        }
        async fn delete(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
            CampgroundRepository::delete(self.store.as_ref(), id).await
        }
        async fn count(&self) -> Result<u64, RepositoryError> {
            CampgroundRepository::count(self.store.as_ref()).await
        }
    }

    #[tokio::test]
    async fn test_failed_attach_removes_the_new_review() {
        let f = fixture().await;
        let reviews = ReviewService::new(
            f.store.clone(),
            Arc::new(FailingAttach {
                store: f.store.clone(),
                vanished: false,
            }),
        );

        let result = reviews.create(f.campground.id, nice(), f.user.id).await;

        assert!(matches!(
            result,
            Err(ServiceError::Repository(RepositoryError::Backend(_)))
        ));
        assert_eq!(f.reviews.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_campground_vanishing_mid_create_removes_the_new_review() {
        let f = fixture().await;
        let reviews = ReviewService::new(
            f.store.clone(),
            Arc::new(FailingAttach {
                store: f.store.clone(),
                vanished: true,
            }),
        );

        let created = reviews.create(f.campground.id, nice(), f.user.id).await.unwrap();

        assert!(created.is_none());
        assert_eq!(f.reviews.count().await.unwrap(), 0);
    }
}
