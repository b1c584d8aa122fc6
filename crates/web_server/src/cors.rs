use actix_cors::Cors;
use actix_web::http::{Method, header};

const PREFLIGHT_MAX_AGE_SECS: usize = 86400;

/// Cross-origin policy for the frontend.
///
/// With a configured origin only that origin is allowed; without one any
/// origin is. Credentials are always allowed.
pub fn cors(frontend_url: Option<&str>) -> Cors {
    let cors = Cors::default()
        .supports_credentials()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE_SECS);

    match frontend_url {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    macro_rules! app {
        ($frontend_url:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors($frontend_url))
                    .route("/campgrounds", web::get().to(|| async { HttpResponse::Ok().finish() })),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_preflight_is_answered() {
        let app = app!(Some("http://localhost:5173"));

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/campgrounds")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "PUT"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(headers.get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "86400");
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("PUT") && methods.contains("DELETE"));
    }

    #[actix_web::test]
    async fn test_only_the_configured_origin_is_allowed() {
        let app = app!(Some("http://localhost:5173"));

        let req = test::TestRequest::get()
            .uri("/campgrounds")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );

        let req = test::TestRequest::get()
            .uri("/campgrounds")
            .insert_header((header::ORIGIN, "http://evil.example"))
            .to_request();
        let res = test::try_call_service(&app, req).await;
        let allowed = match res {
            Ok(res) => res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).cloned(),
            Err(_) => None,
        };
        assert!(allowed.is_none());
    }

    #[actix_web::test]
    async fn test_any_origin_without_configuration() {
        let app = app!(None);

        let req = test::TestRequest::get()
            .uri("/campgrounds")
            .insert_header((header::ORIGIN, "http://localhost:3001"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        // Credentials force the request origin to be echoed instead of `*`
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3001"
        );
    }
}
