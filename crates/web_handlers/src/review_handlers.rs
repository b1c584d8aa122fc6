use actix_web::{HttpResponse, Result, web};

use auth_services::AuthenticatedUser;
use campground_services::AccessError;
use campground_services::validation::ReviewForm;

use crate::error::ApiError;
use crate::parse_id;
use crate::state::AppState;

fn campground_not_found() -> ApiError {
    ApiError::NotFound("Campground not found".to_string())
}

/// Adds a review by the caller to a campground
pub async fn create_review(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    request: web::Json<ReviewForm>,
) -> Result<HttpResponse, ApiError> {
    let campground_id = parse_id(&path).ok_or_else(campground_not_found)?;
    let input = request.into_inner().into_input()?;

    let review = state
        .reviews
        .create(campground_id, input, user.0)
        .await?
        .ok_or_else(campground_not_found)?;

    Ok(HttpResponse::Created().json(review))
}

/// Deletes one of the caller's reviews and detaches it from the campground.
/// 404 unless the campground in the path lists the review.
pub async fn delete_review(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (campground_id, review_id) = path.into_inner();
    let campground_id = parse_id(&campground_id).ok_or(AccessError::NotFound("campground"))?;
    let review_id = parse_id(&review_id).ok_or(AccessError::NotFound("review"))?;

    state.ownership.review(review_id, Some(user.0)).await?;

    if !state.reviews.delete(campground_id, review_id).await? {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Shows one review with its author
pub async fn show_review(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Review not found".to_string());

    let id = parse_id(&path).ok_or_else(not_found)?;
    let review = state.reviews.get_by_id(id).await?.ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(review))
}
