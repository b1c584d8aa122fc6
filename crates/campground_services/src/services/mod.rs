mod campground_service;
mod review_service;
mod user_service;

pub use campground_service::CampgroundService;
pub use review_service::ReviewService;
pub use user_service::UserService;
