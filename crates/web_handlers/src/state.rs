use std::sync::Arc;
use std::time::Instant;

use auth_services::JwtService;
use campground_services::ports::{
    CampgroundRepository, Geocoder, ImageStorage, PasswordHasher, ReviewRepository, StoreHealth,
    UserRepository,
};
use campground_services::{CampgroundService, OwnershipGuard, ReviewService, UserService};

/// Adapters the HTTP layer is wired with
pub struct AppPorts {
    /// Campground storage
    pub campgrounds: Arc<dyn CampgroundRepository>,
    /// Review storage
    pub reviews: Arc<dyn ReviewRepository>,
    /// User storage
    pub users: Arc<dyn UserRepository>,
    /// Password hashing
    pub hasher: Arc<dyn PasswordHasher>,
    /// Forward geocoding
    pub geocoder: Arc<dyn Geocoder>,
    /// External image store
    pub images: Arc<dyn ImageStorage>,
    /// Store liveness check
    pub health: Arc<dyn StoreHealth>,
}

/// Shared state handed to every handler through `web::Data`
pub struct AppState {
    /// Campground use cases
    pub campgrounds: CampgroundService,
    /// Review use cases
    pub reviews: ReviewService,
    /// Registration and login
    pub users: UserService,
    /// Ownership checks for mutating routes
    pub ownership: OwnershipGuard,
    /// Forward geocoding for create and location edits
    pub geocoder: Arc<dyn Geocoder>,
    /// Image deletion after edits
    pub images: Arc<dyn ImageStorage>,
    /// Database check for `/health`
    pub health: Arc<dyn StoreHealth>,
    /// Token issuing for register and login
    pub jwt: JwtService,
    /// Name of the running environment
    pub environment: String,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Builds the services on top of `ports`
    pub fn new(ports: AppPorts, jwt: JwtService, environment: impl Into<String>) -> Self {
        Self {
            campgrounds: CampgroundService::new(ports.campgrounds.clone(), ports.reviews.clone()),
            reviews: ReviewService::new(ports.reviews.clone(), ports.campgrounds.clone()),
            users: UserService::new(ports.users, ports.hasher),
            ownership: OwnershipGuard::new(ports.campgrounds, ports.reviews),
            geocoder: ports.geocoder,
            images: ports.images,
            health: ports.health,
            jwt,
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }
}
