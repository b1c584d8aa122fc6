//! The route table.
//!
//! Bearer-token resolution is not part of it: the server wraps the whole app
//! in [`auth_services::AuthMiddleware`] so anonymous and signed-in callers hit
//! the same routes.

use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpResponse, error, web};

use crate::campground_handlers::*;
use crate::error::ApiError;
use crate::home_handlers::{health, home};
use crate::review_handlers::*;
use crate::user_handlers::*;

/// Sources the frontend loads scripts, styles, tiles and images from
pub const CONTENT_SECURITY_POLICY: &str = concat!(
    "default-src 'self'; ",
    "script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://api.mapbox.com https://cdnjs.cloudflare.com; ",
    "style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://api.mapbox.com https://fonts.googleapis.com https://cdnjs.cloudflare.com; ",
    "connect-src 'self' https://api.mapbox.com https://events.mapbox.com https://cdn.jsdelivr.net https://*.tiles.mapbox.com https://*.mapbox.com; ",
    "img-src 'self' data: blob: https://images.unsplash.com https://res.cloudinary.com https://api.mapbox.com https://*.mapbox.com; ",
    "font-src 'self' https://fonts.gstatic.com https://cdn.jsdelivr.net; ",
    "worker-src 'self' blob:; ",
    "child-src blob:; ",
    "frame-src 'self'; ",
    "object-src 'none'; ",
    "base-uri 'self'; ",
    "form-action 'self'; ",
    "frame-ancestors 'self'",
);

/// Security headers sent with every response
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Content-Security-Policy", CONTENT_SECURITY_POLICY))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
        .add(("X-DNS-Prefetch-Control", "off"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::NotFound(format!("Not Found: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req| {
        ApiError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}

/// Registers every API route along with the extractor error handlers
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .route("/", web::get().to(home))
        .route("/health", web::get().to(health))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .route("/api/user/me", web::get().to(current_user))
        .route("/reviews/{id}", web::get().to(show_review))
        .service(
            web::scope("/campgrounds")
                .route("", web::get().to(list_campgrounds))
                .route("", web::post().to(create_campground))
                .route("/{id}", web::get().to(show_campground))
                .route("/{id}", web::put().to(update_campground))
                .route("/{id}", web::delete().to(delete_campground))
                .route("/{id}/edit", web::get().to(edit_campground))
                .route("/{id}/reviews", web::post().to(create_review))
                .route(
                    "/{id}/reviews/{review_id}",
                    web::delete().to(delete_review),
                ),
        );
}

/// Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "message": "Not Found"
    }))
}
