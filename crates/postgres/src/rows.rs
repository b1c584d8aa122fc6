//! Row types and their mapping onto domain entities.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use campground_services::error::RepositoryError;
use campground_services::{Author, Campground, Geometry, Image, Review, User};

pub(crate) const CAMPGROUND_COLUMNS: &str = "id, title, description, location, geometry, price, \
     images, author_id, review_ids, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str = "id, body, rating, author_id, created_at, updated_at";

pub(crate) const USER_COLUMNS: &str =
    "id, email, username, password_hash, created_at, updated_at";

/// Maps a driver error, turning unique violations into `Duplicate`
pub(crate) fn db_error(error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some("23505") {
            let field = match db.constraint() {
                Some(name) if name.contains("email") => "email",
                Some(name) if name.contains("username") => "username",
                _ => "id",
            };
            return RepositoryError::Duplicate {
                field: field.to_string(),
            };
        }
    }
    RepositoryError::Backend(error.to_string())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CampgroundRow {
    id: Uuid,
    title: String,
    description: String,
    location: String,
    geometry: Json<Geometry>,
    price: f64,
    images: Json<Vec<Image>>,
    author_id: Uuid,
    review_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CampgroundRow> for Campground {
    fn from(row: CampgroundRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            geometry: row.geometry.0,
            price: row.price,
            images: row.images.0,
            author_id: row.author_id,
            review_ids: row.review_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    body: String,
    rating: i16,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating).map_err(|_| {
            RepositoryError::Backend(format!("invalid rating {} on review {}", row.rating, row.id))
        })?;

        Ok(Self {
            id: row.id,
            body: row.body,
            rating,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A review joined with its (possibly deleted) author
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    pub(crate) review: ReviewRow,
    pub(crate) author_username: Option<String>,
    pub(crate) author_email: Option<String>,
}

impl ReviewWithAuthorRow {
    pub(crate) fn author(&self) -> Option<Author> {
        match (&self.author_username, &self.author_email) {
            (Some(username), Some(email)) => Some(Author {
                id: self.review.author_id,
                username: username.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_row(rating: i16) -> ReviewRow {
        ReviewRow {
            id: Uuid::new_v4(),
            body: "nice".to_string(),
            rating,
            author_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_review_row_maps_rating() {
        assert_eq!(Review::try_from(review_row(4)).unwrap().rating, 4);
        assert!(matches!(
            Review::try_from(review_row(-1)),
            Err(RepositoryError::Backend(_))
        ));
    }

    #[test]
    fn test_author_requires_joined_user() {
        let joined = ReviewWithAuthorRow {
            review: review_row(5),
            author_username: Some("a".to_string()),
            author_email: Some("a@x.com".to_string()),
        };
        let author = joined.author().unwrap();
        assert_eq!(author.id, joined.review.author_id);
        assert_eq!(author.username, "a");

        let orphan = ReviewWithAuthorRow {
            review: review_row(5),
            author_username: None,
            author_email: None,
        };
        assert!(orphan.author().is_none());
    }

    #[test]
    fn test_non_database_errors_are_backend_errors() {
        assert!(matches!(
            db_error(sqlx::Error::RowNotFound),
            RepositoryError::Backend(_)
        ));
    }
}
