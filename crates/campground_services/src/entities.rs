use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder image shown for campgrounds that have no uploaded images
pub const DEFAULT_IMAGE_URL: &str = "https://images.unsplash.com/photo-1508873696983-2dfd5898f08b?ixlib=rb-4.0.3&auto=format&fit=crop&w=2070&q=80";

/// Filename attached to the placeholder image
pub const DEFAULT_IMAGE_FILENAME: &str = "default-campground";

/// An image owned by a campground, referenced by its storage filename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Public URL of the stored image
    #[serde(alias = "path")]
    pub url: String,
    /// Identifier of the image in the external image store
    pub filename: String,
}

impl Image {
    /// Creates an image value from its URL and storage filename
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }

    /// The placeholder image used by the featured listing
    pub fn placeholder() -> Self {
        Self::new(DEFAULT_IMAGE_URL, DEFAULT_IMAGE_FILENAME)
    }

    /// Square 200px crop
    pub fn thumbnail(&self) -> String {
        self.transformed("w_200,h_200,c_fill,q_auto:low")
    }

    /// 400px wide rendition
    pub fn small(&self) -> String {
        self.transformed("w_400,q_auto:good")
    }

    /// 800px wide rendition
    pub fn medium(&self) -> String {
        self.transformed("w_800,q_auto:good")
    }

    fn transformed(&self, transformation: &str) -> String {
        self.url
            .replacen("/upload", &format!("/upload/{transformation}"), 1)
    }
}

/// GeoJSON geometry kind. Only points are produced by geocoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// A single coordinate pair
    Point,
}

/// A geocoded location in GeoJSON order (`[longitude, latitude]`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Always `Point`
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

impl Geometry {
    /// Creates a point geometry
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates: [longitude, latitude],
        }
    }

    /// Longitude of the point
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    /// Latitude of the point
    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Lower-cased, trimmed email address
    pub email: String,
    /// Unique login name
    pub username: String,
    /// Opaque password credential, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the user registered
    pub created_at: DateTime<Utc>,
    /// When the user was last modified
    pub updated_at: DateTime<Utc>,
}

/// Data needed to persist a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email address
    pub email: String,
    /// Unique login name
    pub username: String,
    /// Hashed password credential
    pub password_hash: String,
}

/// Public projection of a user, used wherever an author is resolved inline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// A campground listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campground {
    /// Unique identifier for the campground
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Free-text address that was geocoded
    pub location: String,
    /// Geocoded point for `location`
    pub geometry: Geometry,
    /// Price per night, never negative
    pub price: f64,
    /// Images in upload order
    pub images: Vec<Image>,
    /// Owning user, fixed at creation
    pub author_id: Uuid,
    /// Reviews attached to this campground, in creation order
    pub review_ids: Vec<Uuid>,
    /// When the campground was created
    pub created_at: DateTime<Utc>,
    /// When the campground was last modified
    pub updated_at: DateTime<Utc>,
}

/// Data needed to persist a new campground. New campgrounds start with no reviews.
#[derive(Debug, Clone)]
pub struct NewCampground {
    /// Display title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Free-text address
    pub location: String,
    /// Geocoded point for `location`
    pub geometry: Geometry,
    /// Price per night
    pub price: f64,
    /// Uploaded images
    pub images: Vec<Image>,
    /// Owning user
    pub author_id: Uuid,
}

/// Scalar fields of a campground that an update may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CampgroundChanges {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New address text
    pub location: Option<String>,
    /// New geocoded point, set when the location was re-geocoded
    pub geometry: Option<Geometry>,
    /// New price
    pub price: Option<f64>,
}

impl CampgroundChanges {
    /// Returns `true` when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.geometry.is_none()
            && self.price.is_none()
    }
}

/// A campground with its author and reviews (each with its author) resolved
#[derive(Debug, Clone, Serialize)]
pub struct CampgroundDetails {
    /// The campground record
    #[serde(flatten)]
    pub campground: Campground,
    /// The owning user, `None` if the user record is gone
    pub author: Option<Author>,
    /// Reviews in `review_ids` order
    pub reviews: Vec<ReviewDetails>,
}

/// A star rating with a text comment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique identifier for the review
    pub id: Uuid,
    /// Comment text
    pub body: String,
    /// Star rating, 1 through 5
    pub rating: u8,
    /// Owning user, fixed at creation
    pub author_id: Uuid,
    /// When the review was created
    pub created_at: DateTime<Utc>,
    /// When the review was last modified
    pub updated_at: DateTime<Utc>,
}

/// Data needed to persist a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Comment text
    pub body: String,
    /// Star rating, 1 through 5
    pub rating: u8,
    /// Owning user
    pub author_id: Uuid,
}

/// A review with its author resolved
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDetails {
    /// The review record
    #[serde(flatten)]
    pub review: Review,
    /// The owning user, `None` if the user record is gone
    pub author: Option<Author>,
}

/// Resources that belong to exactly one user
pub trait Owned {
    /// The owning user's id
    fn author_id(&self) -> Uuid;
}

impl Owned for Campground {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Review {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_variants_insert_transformation_after_upload() {
        let image = Image::new(
            "https://res.cloudinary.com/demo/image/upload/v1/yelpcamp/abc.jpg",
            "yelpcamp/abc",
        );

        assert_eq!(
            image.thumbnail(),
            "https://res.cloudinary.com/demo/image/upload/w_200,h_200,c_fill,q_auto:low/v1/yelpcamp/abc.jpg"
        );
        assert_eq!(
            image.medium(),
            "https://res.cloudinary.com/demo/image/upload/w_800,q_auto:good/v1/yelpcamp/abc.jpg"
        );
    }

    #[test]
    fn test_image_variants_leave_foreign_urls_alone() {
        let image = Image::placeholder();
        assert_eq!(image.small(), DEFAULT_IMAGE_URL);
        assert_eq!(image.filename, DEFAULT_IMAGE_FILENAME);
    }

    #[test]
    fn test_geometry_serializes_as_geojson_point() {
        let geometry = Geometry::point(-122.4, 37.8);
        let json = serde_json::to_value(geometry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "type": "Point", "coordinates": [-122.4, 37.8] })
        );
        assert_eq!(geometry.longitude(), -122.4);
        assert_eq!(geometry.latitude(), 37.8);
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            password_hash: "secret-hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
    }
}
