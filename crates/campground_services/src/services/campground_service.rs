use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::*;
use crate::error::ServiceError;
use crate::ports::{CampgroundRepository, ReviewRepository};
use crate::validation::CampgroundInput;

/// Campground use cases: listing, creation, owner edits and cascading deletion
#[derive(Clone)]
pub struct CampgroundService {
    campgrounds: Arc<dyn CampgroundRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl CampgroundService {
    /// Creates a service over the given repositories
    pub fn new(
        campgrounds: Arc<dyn CampgroundRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            campgrounds,
            reviews,
        }
    }

    /// Every campground, without relations
    pub async fn get_all(&self) -> Result<Vec<Campground>, ServiceError> {
        Ok(self.campgrounds.find_all().await?)
    }

    /// A campground with its author and reviews resolved
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<CampgroundDetails>, ServiceError> {
        Ok(self.campgrounds.find_by_id_with_relations(id).await?)
    }

    /// Persists a new campground owned by `author_id`.
    ///
    /// `geometry` comes from the caller's geocoder so the service never talks
    /// to the geocoding service itself.
    pub async fn create(
        &self,
        input: CampgroundInput,
        images: Vec<Image>,
        geometry: Geometry,
        author_id: Uuid,
    ) -> Result<Campground, ServiceError> {
        let campground = self
            .campgrounds
            .create(NewCampground {
                title: input.title,
                description: input.description,
                location: input.location,
                geometry,
                price: input.price,
                images,
                author_id,
            })
            .await?;

        info!("Campground {} created by {}", campground.id, author_id);
        Ok(campground)
    }

    /// Applies scalar changes, then appends `new_images`, then drops every
    /// image named in `delete_filenames`. Returns `None` if the campground
    /// does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &CampgroundChanges,
        new_images: &[Image],
        delete_filenames: &[String],
    ) -> Result<Option<Campground>, ServiceError> {
        let Some(mut result) = self.campgrounds.update(id, changes).await? else {
            return Ok(None);
        };

        if !new_images.is_empty() {
            if let Some(with_images) = self.campgrounds.add_images(id, new_images).await? {
                result = with_images;
            }
        }

        if !delete_filenames.is_empty() {
            if let Some(without_images) =
                self.campgrounds.remove_images(id, delete_filenames).await?
            {
                result = without_images;
            }
        }

        Ok(Some(result))
    }

    /// Deletes the campground and every review it references.
    ///
    /// Returns `true` iff the campground existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let Some(deleted) = self.campgrounds.delete(id).await? else {
            return Ok(false);
        };

        if !deleted.review_ids.is_empty() {
            let removed = self.reviews.delete_many(&deleted.review_ids).await?;
            if removed != deleted.review_ids.len() as u64 {
                warn!(
                    "Campground {} referenced {} reviews but {} were removed",
                    id,
                    deleted.review_ids.len(),
                    removed
                );
            }
        }

        info!("Campground {} deleted", id);
        Ok(true)
    }

    /// Up to `limit` campgrounds in storage order. Campgrounds without images
    /// get the placeholder image in the returned copy only.
    pub async fn get_featured(&self, limit: usize) -> Result<Vec<Campground>, ServiceError> {
        let campgrounds = self.campgrounds.find_many(limit).await?;

        Ok(campgrounds
            .into_iter()
            .map(|mut campground| {
                if campground.images.is_empty() {
                    campground.images = vec![Image::placeholder()];
                }
                campground
            })
            .collect())
    }

    /// Number of stored campgrounds
    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.campgrounds.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ports::ReviewRepository;

    fn service(store: &Arc<InMemoryStore>) -> CampgroundService {
        CampgroundService::new(store.clone(), store.clone())
    }

    fn input(title: &str) -> CampgroundInput {
        CampgroundInput {
            title: title.to_string(),
            price: 10.0,
            location: "L".to_string(),
            description: "D".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_scalar_fields() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let author = Uuid::new_v4();

        let created = service
            .create(input("T"), Vec::new(), Geometry::point(1.0, 2.0), author)
            .await
            .unwrap();
        assert!(created.review_ids.is_empty());
        assert!(created.images.is_empty());

        let all = service.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "T");

        let fetched = service.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.campground.title, "T");
        assert_eq!(fetched.campground.price, 10.0);
        assert_eq!(fetched.campground.location, "L");
        assert_eq!(fetched.campground.description, "D");
        assert_eq!(fetched.campground.geometry, Geometry::point(1.0, 2.0));
        assert_eq!(fetched.campground.author_id, author);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);

        assert!(service.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(
            service
                .update(Uuid::new_v4(), &CampgroundChanges::default(), &[], &[])
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_adds_before_removing() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let created = service
            .create(
                input("T"),
                vec![Image::new("https://cdn/upload/old.jpg", "old")],
                Geometry::point(1.0, 2.0),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let changes = CampgroundChanges {
            title: Some("Renamed".to_string()),
            price: Some(25.0),
            ..CampgroundChanges::default()
        };
        let updated = service
            .update(
                created.id,
                &changes,
                &[
                    Image::new("https://cdn/upload/new.jpg", "new"),
                    Image::new("https://cdn/upload/tmp.jpg", "tmp"),
                ],
                &["old".to_string(), "tmp".to_string()],
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.price, 25.0);
        assert_eq!(updated.location, "L");
        assert_eq!(
            updated.images,
            vec![Image::new("https://cdn/upload/new.jpg", "new")]
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_reviews() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let author = Uuid::new_v4();
        let created = service
            .create(input("T"), Vec::new(), Geometry::point(1.0, 2.0), author)
            .await
            .unwrap();

        let mut review_ids = Vec::new();
        for body in ["one", "two"] {
            let review = ReviewRepository::create(
                store.as_ref(),
                NewReview {
                    body: body.to_string(),
                    rating: 4,
                    author_id: author,
                },
            )
            .await
            .unwrap();
            store.push_review(created.id, review.id).await.unwrap();
            review_ids.push(review.id);
        }

        assert!(service.delete(created.id).await.unwrap());
        assert!(service.get_by_id(created.id).await.unwrap().is_none());
        for review_id in review_ids {
            assert!(
                ReviewRepository::find_by_id(store.as_ref(), review_id)
                    .await
                    .unwrap()
                    .is_none()
            );
        }
        assert_eq!(ReviewRepository::count(store.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_twice_is_true_then_false() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let created = service
            .create(input("T"), Vec::new(), Geometry::point(1.0, 2.0), Uuid::new_v4())
            .await
            .unwrap();

        assert!(service.delete(created.id).await.unwrap());
        assert!(!service.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_featured_placeholder_does_not_touch_storage() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let created = service
            .create(input("T"), Vec::new(), Geometry::point(1.0, 2.0), Uuid::new_v4())
            .await
            .unwrap();

        let featured = service.get_featured(1).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].images.len(), 1);
        assert_eq!(featured[0].images[0].filename, DEFAULT_IMAGE_FILENAME);

        let stored = service.get_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.campground.images.is_empty());
    }

    #[tokio::test]
    async fn test_featured_respects_limit_and_keeps_real_images() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let author = Uuid::new_v4();
        let image = Image::new("https://cdn/upload/a.jpg", "a");
        for title in ["one", "two", "three", "four"] {
            service
                .create(input(title), vec![image.clone()], Geometry::point(0.0, 0.0), author)
                .await
                .unwrap();
        }

        let featured = service.get_featured(3).await.unwrap();
        assert_eq!(featured.len(), 3);
        assert!(featured.iter().all(|c| c.images == vec![image.clone()]));
        assert_eq!(service.count().await.unwrap(), 4);
    }
}
