use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username at the time the token was issued
    pub username: String,
    /// Expiry, seconds since the epoch
    pub exp: usize,
    /// Issue time, seconds since the epoch
    pub iat: usize,
}

/// Errors that can occur during authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The route requires a signed-in user and none was presented
    #[error("You must be signed in")]
    NotAuthenticated,

    /// A bearer token was presented but did not verify
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Encoding or decoding a token failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::NotAuthenticated | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let message = match self {
            AuthError::Jwt(e) => {
                log::error!("Token error: {}", e);
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": message
        }))
    }
}
