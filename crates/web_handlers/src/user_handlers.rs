use actix_web::{HttpResponse, Result, web};

use auth_services::AuthenticatedUser;
use campground_services::Author;
use campground_services::validation::{LoginForm, RegisterForm};

use crate::error::ApiError;
use crate::state::AppState;
use crate::views::AuthResponse;

/// Registers a user and signs them in.
/// Returns a 201 Created response with the user and a bearer token.
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterForm>,
) -> Result<HttpResponse, ApiError> {
    let input = request.into_inner().into_input()?;

    let user = state.users.register(input).await?;
    let token = state.jwt.generate_token(&user)?;

    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// Verifies credentials and returns the user with a bearer token
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = request.into_inner().into_credentials()?;

    let user = state
        .users
        .authenticate(&username, &password)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid username or password".to_string()))?;
    let token = state.jwt.generate_token(&user)?;

    Ok(HttpResponse::Ok().json(AuthResponse { user, token }))
}

/// Tokens are stateless, so signing out only needs the client to drop its token
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Goodbye!"
    }))
}

/// The signed-in user
pub async fn current_user(
    state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    let not_authenticated = || ApiError::Unauthenticated("Not authenticated".to_string());

    let AuthenticatedUser(user_id) = user.ok_or_else(not_authenticated)?;
    let user = state
        .users
        .get_by_id(user_id)
        .await?
        .ok_or_else(not_authenticated)?;

    Ok(HttpResponse::Ok().json(Author::from(&user)))
}
