use actix_web::{
    Error, HttpMessage, ResponseError, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
};
use uuid::Uuid;

use crate::jwt::JwtService;
use crate::types::AuthError;

/// Resolves the bearer token, if any, to a user id stored in the request
/// extensions.
///
/// Requests without an `Authorization` header pass through anonymously so
/// public routes stay reachable; a header carrying an invalid or expired
/// token is rejected with 401.
#[derive(Clone)]
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    /// Creates the middleware verifying tokens with `jwt_service`
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .map(str::to_owned);

            if let Some(token) = token {
                match jwt_service.extract_user_id_from_token(&token) {
                    Ok(user_id) => {
                        req.extensions_mut().insert(user_id);
                    }
                    Err(e) => {
                        log::debug!("Rejected bearer token: {}", e);
                        let response = AuthError::InvalidToken.error_response();
                        return Ok(req.into_response(response).map_into_right_body());
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Custom extractor for authenticated user ID.
///
/// Fails with 401 when the request carried no valid token. Wrap it in
/// `Option` for routes that handle anonymous callers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let user_id = req.extensions().get::<Uuid>().copied();

        ready(match user_id {
            Some(id) => Ok(AuthenticatedUser(id)),
            None => Err(AuthError::NotAuthenticated.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use campground_services::User;
    use chrono::Utc;

    async fn whoami(user: Option<AuthenticatedUser>) -> HttpResponse {
        match user {
            Some(AuthenticatedUser(id)) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn private(AuthenticatedUser(id): AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(id.to_string())
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    macro_rules! app {
        ($jwt:expr) => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($jwt))
                    .route("/whoami", web::get().to(whoami))
                    .route("/private", web::get().to(private)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_missing_token_passes_anonymously() {
        let app = app!(JwtService::new("secret"));

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn test_valid_token_identifies_user() {
        let jwt = JwtService::new("secret");
        let user = user();
        let token = jwt.generate_token(&user).unwrap();
        let app = app!(jwt);

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user.id.to_string());
    }

    #[actix_web::test]
    async fn test_invalid_token_is_rejected() {
        let app = app!(JwtService::new("secret"));

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[actix_web::test]
    async fn test_extractor_requires_user() {
        let app = app!(JwtService::new("secret"));

        let req = test::TestRequest::get().uri("/private").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "You must be signed in");
    }
}
