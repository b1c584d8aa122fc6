use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use auth_services::AuthError;
use campground_services::{AccessError, ExternalServiceError, ServiceError, ValidationFailed};

/// Message returned for every unexpected failure; details are only logged
pub const UNEXPECTED_MESSAGE: &str = "Something went wrong";

/// Errors returned by the HTTP handlers.
///
/// Every variant renders as `{"success": false, "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The id in the path did not resolve
    #[error("{0}")]
    NotFound(String),

    /// No valid bearer token
    #[error("{0}")]
    Unauthenticated(String),

    /// Signed in but not the owner
    #[error("{0}")]
    Forbidden(String),

    /// The request body failed its schema
    #[error("{0}")]
    Validation(String),

    /// The request could not be processed as sent
    #[error("{0}")]
    BadRequest(String),

    /// An outbound service could not satisfy the request
    #[error("{0}")]
    Upstream(String),

    /// Anything else
    #[error("{UNEXPECTED_MESSAGE}: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Message shown to the client
    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(m)
            | ApiError::Unauthenticated(m)
            | ApiError::Forbidden(m)
            | ApiError::Validation(m)
            | ApiError::BadRequest(m)
            | ApiError::Upstream(m) => m,
            ApiError::Unexpected(_) => UNEXPECTED_MESSAGE,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Upstream(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Unexpected(detail) = self {
            log::error!("Unexpected error: {}", detail);
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.message()
        }))
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::EmailTaken | ServiceError::UsernameTaken => {
                ApiError::BadRequest(error.to_string())
            }
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::NotFound(_) => ApiError::NotFound(error.to_string()),
            AccessError::Forbidden => ApiError::Forbidden(error.to_string()),
            AccessError::Repository(e) => ApiError::Unexpected(e.to_string()),
        }
    }
}

impl From<ValidationFailed> for ApiError {
    fn from(error: ValidationFailed) -> Self {
        ApiError::Validation(error.message)
    }
}

impl From<ExternalServiceError> for ApiError {
    fn from(error: ExternalServiceError) -> Self {
        ApiError::Unexpected(error.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotAuthenticated | AuthError::InvalidToken => {
                ApiError::Unauthenticated(error.to_string())
            }
            AuthError::Jwt(e) => ApiError::Unexpected(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use campground_services::RepositoryError;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_taxonomy_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Upstream("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unexpected("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            let (status, body) = body_of(error).await;
            assert_eq!(status, expected);
            assert_eq!(body["success"], false);
        }
    }

    #[actix_web::test]
    async fn test_unexpected_hides_details() {
        let (_, body) = body_of(ApiError::Unexpected("connection refused".into())).await;
        assert_eq!(body["message"], UNEXPECTED_MESSAGE);
    }

    #[test]
    fn test_domain_errors_map_to_taxonomy() {
        assert!(matches!(
            ApiError::from(AccessError::NotFound("campground")),
            ApiError::NotFound(m) if m == "Cannot find that campground!"
        ));
        assert!(matches!(
            ApiError::from(AccessError::Forbidden),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(ServiceError::EmailTaken),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ServiceError::Repository(RepositoryError::Backend("x".into()))),
            ApiError::Unexpected(_)
        ));
        assert!(matches!(
            ApiError::from(ValidationFailed::new("Rating must be at most 5")),
            ApiError::Validation(m) if m == "Rating must be at most 5"
        ));
    }
}
