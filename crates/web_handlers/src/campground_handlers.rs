use actix_web::{HttpRequest, HttpResponse, Result, web};
use uuid::Uuid;

use auth_services::AuthenticatedUser;
use campground_services::ports::ImageUpload;
use campground_services::{AccessError, Geometry, Image};

use crate::error::ApiError;
use crate::form_data::{CampgroundRequest, read_campground_request};
use crate::parse_id;
use crate::state::AppState;
use crate::views::{CampgroundDetailsView, CampgroundView};

const CAMPGROUND_NOT_FOUND: &str = "Campground not found";
const GEOCODE_FAILED: &str = "Could not geocode location";

fn not_found() -> ApiError {
    ApiError::NotFound(CAMPGROUND_NOT_FOUND.to_string())
}

async fn geocode(state: &AppState, location: &str) -> Result<Geometry, ApiError> {
    state
        .geocoder
        .forward_geocode(location)
        .await?
        .ok_or_else(|| ApiError::Upstream(GEOCODE_FAILED.to_string()))
}

/// Uploads files in order. On failure the ones already stored are removed.
async fn upload_images(
    state: &AppState,
    files: Vec<ImageUpload>,
) -> Result<Vec<Image>, ApiError> {
    let mut images = Vec::with_capacity(files.len());
    for file in files {
        match state.images.upload(file).await {
            Ok(image) => images.push(image),
            Err(e) => {
                discard(state, images.iter().map(|i| i.filename.as_str())).await;
                return Err(e.into());
            }
        }
    }
    Ok(images)
}

/// Best-effort removal from the image store
async fn discard<'a>(state: &AppState, filenames: impl IntoIterator<Item = &'a str>) {
    for filename in filenames {
        if let Err(e) = state.images.delete(filename).await {
            log::warn!("Failed to delete image {} from storage: {}", filename, e);
        }
    }
}

/// Lists every campground
pub async fn list_campgrounds(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let campgrounds = state.campgrounds.get_all().await?;
    let views: Vec<CampgroundView> = campgrounds.into_iter().map(CampgroundView::from).collect();

    Ok(HttpResponse::Ok().json(views))
}

/// Shows one campground with its author and reviews
pub async fn show_campground(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path).ok_or_else(not_found)?;
    let details = state.campgrounds.get_by_id(id).await?.ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(CampgroundDetailsView::from(details)))
}

/// Creates a campground owned by the caller from a JSON or multipart body.
/// The location is geocoded and attached files are uploaded before anything
/// is stored.
pub async fn create_campground(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let CampgroundRequest { form, files } = read_campground_request(&req, payload).await?;
    let submission = form.into_submission()?;
    let geometry = geocode(&state, &submission.campground.location).await?;
    let images = upload_images(&state, files).await?;

    let created = state
        .campgrounds
        .create(submission.campground, images.clone(), geometry, user.0)
        .await;

    match created {
        Ok(campground) => Ok(HttpResponse::Created().json(CampgroundView::from(campground))),
        Err(e) => {
            discard(&state, images.iter().map(|i| i.filename.as_str())).await;
            Err(e.into())
        }
    }
}

/// Returns the campground for its owner to edit
pub async fn edit_campground(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path).ok_or(AccessError::NotFound("campground"))?;
    state.ownership.campground(id, Some(user.0)).await?;

    let details = state.campgrounds.get_by_id(id).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(CampgroundDetailsView::from(details)))
}

/// Replaces the campground's fields, appends uploaded images and drops the
/// ones named in `deleteImages`. A changed location is geocoded again.
///
/// Ownership is checked before the body is looked at. Only filenames that
/// belong to this campground are removed.
pub async fn update_campground(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path).ok_or(AccessError::NotFound("campground"))?;
    let existing = state.ownership.campground(id, Some(user.0)).await?;

    let CampgroundRequest { form, files } = read_campground_request(&req, payload).await?;
    let submission = form.into_submission()?;

    let (delete_images, foreign): (Vec<String>, Vec<String>) = submission
        .delete_images
        .into_iter()
        .partition(|filename| existing.images.iter().any(|i| &i.filename == filename));
    if !foreign.is_empty() {
        log::warn!("Ignoring images not attached to campground {}: {:?}", id, foreign);
    }

    let relocated = submission.campground.location != existing.location;
    let mut changes = submission.campground.into_changes();
    if relocated {
        if let Some(location) = changes.location.as_deref() {
            changes.geometry = Some(geocode(&state, location).await?);
        }
    }

    let images = upload_images(&state, files).await?;
    let updated = state
        .campgrounds
        .update(id, &changes, &images, &delete_images)
        .await;

    let campground = match updated {
        Ok(Some(campground)) => campground,
        other => {
            discard(&state, images.iter().map(|i| i.filename.as_str())).await;
            return Err(other.map_or_else(ApiError::from, |_| not_found()));
        }
    };

    discard(&state, delete_images.iter().map(String::as_str)).await;

    Ok(HttpResponse::Ok().json(CampgroundView::from(campground)))
}

/// Deletes the campground and its reviews
pub async fn delete_campground(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id: Uuid = parse_id(&path).ok_or(AccessError::NotFound("campground"))?;
    state.ownership.campground(id, Some(user.0)).await?;

    state.campgrounds.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
