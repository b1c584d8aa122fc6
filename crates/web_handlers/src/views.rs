//! JSON shapes returned by the API. Images carry derived size variants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use campground_services::{Author, Campground, CampgroundDetails, Geometry, Image, ReviewDetails, User};

/// An image with its Cloudinary renditions
#[derive(Debug, Serialize)]
pub struct ImageView {
    /// Original URL
    pub url: String,
    /// Storage filename
    pub filename: String,
    /// 200px square crop
    pub thumbnail: String,
    /// 400px wide
    pub small: String,
    /// 800px wide
    pub medium: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            url: image.url.clone(),
            filename: image.filename.clone(),
            thumbnail: image.thumbnail(),
            small: image.small(),
            medium: image.medium(),
        }
    }
}

/// A campground without relations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampgroundView {
    /// Campground id
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Free-text address
    pub location: String,
    /// Geocoded point
    pub geometry: Geometry,
    /// Price per night
    pub price: f64,
    /// Images with renditions
    pub images: Vec<ImageView>,
    /// Owning user id
    pub author_id: Uuid,
    /// Attached review ids
    pub review_ids: Vec<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl From<Campground> for CampgroundView {
    fn from(campground: Campground) -> Self {
        Self {
            images: campground.images.iter().map(ImageView::from).collect(),
            id: campground.id,
            title: campground.title,
            description: campground.description,
            location: campground.location,
            geometry: campground.geometry,
            price: campground.price,
            author_id: campground.author_id,
            review_ids: campground.review_ids,
            created_at: campground.created_at,
            updated_at: campground.updated_at,
        }
    }
}

/// A campground with its author and reviews
#[derive(Debug, Serialize)]
pub struct CampgroundDetailsView {
    /// Campground fields
    #[serde(flatten)]
    pub campground: CampgroundView,
    /// Owning user
    pub author: Option<Author>,
    /// Reviews, each with its author
    pub reviews: Vec<ReviewDetails>,
}

impl From<CampgroundDetails> for CampgroundDetailsView {
    fn from(details: CampgroundDetails) -> Self {
        Self {
            campground: details.campground.into(),
            author: details.author,
            reviews: details.reviews,
        }
    }
}

/// Counters shown on the home page
#[derive(Debug, Default, Serialize)]
pub struct Stats {
    /// Number of campgrounds
    pub campgrounds: u64,
    /// Number of reviews
    pub reviews: u64,
    /// Number of users
    pub users: u64,
}

/// Home page payload
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    /// A few campgrounds to show off
    pub featured_campgrounds: Vec<CampgroundView>,
    /// Site counters
    pub stats: Stats,
}

/// Response to a successful register or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The signed-in user
    pub user: User,
    /// Bearer token for subsequent requests
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_view_has_renditions() {
        let image = Image::new(
            "https://res.cloudinary.com/demo/image/upload/v1/YelpCamp/a.jpg",
            "YelpCamp/a",
        );
        let json = serde_json::to_value(ImageView::from(&image)).unwrap();

        assert_eq!(json["url"], image.url);
        assert_eq!(
            json["thumbnail"],
            "https://res.cloudinary.com/demo/image/upload/w_200,h_200,c_fill,q_auto:low/v1/YelpCamp/a.jpg"
        );
        assert_eq!(
            json["small"],
            "https://res.cloudinary.com/demo/image/upload/w_400,q_auto:good/v1/YelpCamp/a.jpg"
        );
        assert_eq!(
            json["medium"],
            "https://res.cloudinary.com/demo/image/upload/w_800,q_auto:good/v1/YelpCamp/a.jpg"
        );
    }

    #[test]
    fn test_empty_home_view() {
        let json = serde_json::to_value(HomeView::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "featuredCampgrounds": [],
                "stats": { "campgrounds": 0, "reviews": 0, "users": 0 }
            })
        );
    }
}
