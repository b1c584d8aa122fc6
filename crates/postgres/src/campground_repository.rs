use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use campground_services::error::RepositoryError;
use campground_services::ports::CampgroundRepository;
use campground_services::{
    Author, Campground, CampgroundChanges, CampgroundDetails, Image, NewCampground, Review,
    ReviewDetails, User,
};

use crate::rows::{
    CAMPGROUND_COLUMNS, CampgroundRow, ReviewWithAuthorRow, USER_COLUMNS, UserRow, db_error,
};

/// Campgrounds stored in the `campgrounds` table. Images and geometry are
/// JSONB columns; review ids are a `uuid[]` kept in attachment order.
#[derive(Clone)]
pub struct PgCampgroundRepository {
    pool: PgPool,
}

impl PgCampgroundRepository {
    /// Creates a repository over `pool`
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError> {
        let row = sqlx::query_as::<_, CampgroundRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Campground::from))
    }

    async fn reviews_in_order(&self, ids: &[Uuid]) -> Result<Vec<ReviewDetails>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r#"
            SELECT r.id, r.body, r.rating, r.author_id, r.created_at, r.updated_at,
                   u.username AS author_username, u.email AS author_email
            FROM reviews r
            LEFT JOIN users u ON u.id = r.author_id
            WHERE r.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            let author = row.author();
            let review = Review::try_from(row.review)?;
            by_id.insert(review.id, ReviewDetails { review, author });
        }

        // dangling ids are skipped
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[async_trait]
impl CampgroundRepository for PgCampgroundRepository {
    async fn find_all(&self) -> Result<Vec<Campground>, RepositoryError> {
        let sql = format!("SELECT {CAMPGROUND_COLUMNS} FROM campgrounds ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, CampgroundRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Campground::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!("SELECT {CAMPGROUND_COLUMNS} FROM campgrounds WHERE id = $1");
        self.fetch_optional(&sql, id).await
    }

    async fn find_by_id_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError> {
        let Some(campground) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let author = sqlx::query_as::<_, UserRow>(&sql)
            .bind(campground.author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(|row| Author::from(&User::from(row)));

        let reviews = self.reviews_in_order(&campground.review_ids).await?;

        Ok(Some(CampgroundDetails {
            campground,
            author,
            reviews,
        }))
    }

    async fn find_many(&self, limit: usize) -> Result<Vec<Campground>, RepositoryError> {
        let sql = format!(
            "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds ORDER BY created_at, id LIMIT $1"
        );
        let rows = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Campground::from).collect())
    }

    async fn create(&self, campground: NewCampground) -> Result<Campground, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO campgrounds (
                id, title, description, location, geometry, price, images, author_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&campground.title)
            .bind(&campground.description)
            .bind(&campground.location)
            .bind(Json(&campground.geometry))
            .bind(campground.price)
            .bind(Json(&campground.images))
            .bind(campground.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE campgrounds SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                geometry = COALESCE($5, geometry),
                price = COALESCE($6, price),
                updated_at = now()
            WHERE id = $1
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.location.as_deref())
            .bind(changes.geometry.as_ref().map(Json))
            .bind(changes.price)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Campground::from))
    }

    async fn add_images(
        &self,
        id: Uuid,
        images: &[Image],
    ) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE campgrounds SET images = images || $2::jsonb, updated_at = now()
            WHERE id = $1
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(id)
            .bind(Json(images))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Campground::from))
    }

    async fn remove_images(
        &self,
        id: Uuid,
        filenames: &[String],
    ) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE campgrounds SET
                images = COALESCE(
                    (SELECT jsonb_agg(img ORDER BY ord)
                     FROM jsonb_array_elements(images) WITH ORDINALITY AS t(img, ord)
                     WHERE NOT (img->>'filename' = ANY($2))),
                    '[]'::jsonb
                ),
                updated_at = now()
            WHERE id = $1
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(id)
            .bind(filenames)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Campground::from))
    }

    async fn push_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE campgrounds SET review_ids = array_append(review_ids, $2), updated_at = now()
            WHERE id = $1
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Campground::from))
    }

    async fn pull_review(
        &self,
        id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE campgrounds SET review_ids = array_remove(review_ids, $2), updated_at = now()
            WHERE id = $1
            RETURNING {CAMPGROUND_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CampgroundRow>(&sql)
            .bind(id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Campground::from))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let sql = format!("DELETE FROM campgrounds WHERE id = $1 RETURNING {CAMPGROUND_COLUMNS}");
        self.fetch_optional(&sql, id).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campgrounds")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count as u64)
    }
}
