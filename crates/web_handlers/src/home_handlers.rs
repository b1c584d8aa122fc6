use actix_web::{HttpResponse, web};
use chrono::Utc;

use campground_services::ServiceError;

use crate::state::AppState;
use crate::views::{CampgroundView, HomeView, Stats};

/// Number of campgrounds featured on the home page
pub const FEATURED_LIMIT: usize = 3;

async fn load_home(state: &AppState) -> Result<HomeView, ServiceError> {
    let featured = state.campgrounds.get_featured(FEATURED_LIMIT).await?;

    Ok(HomeView {
        featured_campgrounds: featured.into_iter().map(CampgroundView::from).collect(),
        stats: Stats {
            campgrounds: state.campgrounds.count().await?,
            reviews: state.reviews.count().await?,
            users: state.users.count().await?,
        },
    })
}

/// Featured campgrounds and site counters. Never fails: storage errors
/// yield an empty payload.
pub async fn home(state: web::Data<AppState>) -> HttpResponse {
    let view = match load_home(&state).await {
        Ok(view) => view,
        Err(e) => {
            log::error!("Failed to load home page data: {}", e);
            HomeView::default()
        }
    };

    HttpResponse::Ok().json(view)
}

/// Liveness and database connectivity
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let database = if state.health.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "environment": state.environment,
        "database": database
    }))
}
