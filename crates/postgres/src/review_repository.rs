use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use campground_services::error::RepositoryError;
use campground_services::ports::ReviewRepository;
use campground_services::{NewReview, Review, ReviewDetails};

use crate::rows::{REVIEW_COLUMNS, ReviewRow, ReviewWithAuthorRow, db_error};

/// Reviews stored in the `reviews` table
#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    /// Creates a repository over `pool`
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Review::try_from).transpose()
    }

    async fn find_by_id_with_author(
        &self,
        id: Uuid,
    ) -> Result<Option<ReviewDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r#"
            SELECT r.id, r.body, r.rating, r.author_id, r.created_at, r.updated_at,
                   u.username AS author_username, u.email AS author_email
            FROM reviews r
            LEFT JOIN users u ON u.id = r.author_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let author = row.author();
        let review = Review::try_from(row.review)?;
        Ok(Some(ReviewDetails { review, author }))
    }

    async fn create(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO reviews (id, body, rating, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&review.body)
            .bind(i16::from(review.rating))
            .bind(review.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Review::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM reviews WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count as u64)
    }
}
