use actix_web::{
    Error, HttpResponse, Result,
    body::{self, BoxBody, EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use futures_util::future::LocalBoxFuture;
use serde_json::{Value, json};
use std::{
    future::{Ready, ready},
    rc::Rc,
};

/// Adds `stack` and `request {method, url}` to JSON error bodies.
///
/// Only installed in development. `stack` is present when the response was
/// produced from an error value.
#[derive(Clone, Copy, Default)]
pub struct ErrorDetails;

impl<S, B> Transform<S, ServiceRequest> for ErrorDetails
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorDetailsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorDetailsService {
            service: Rc::new(service),
        }))
    }
}

/// Service that rewrites error bodies
pub struct ErrorDetailsService<S> {
    service: Rc<S>,
}

fn is_json_error(res: &HttpResponse<impl MessageBody>) -> bool {
    let failed = res.status().is_client_error() || res.status().is_server_error();
    let json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    failed && json
}

impl<S, B> Service<ServiceRequest> for ErrorDetailsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;
            if !is_json_error(res.response()) {
                return Ok(res.map_into_left_body());
            }

            let stack = res.response().error().map(|e| format!("{:?}", e));
            let request = json!({
                "method": res.request().method().as_str(),
                "url": res.request().uri().to_string(),
            });

            let (http_req, response) = res.into_parts();
            let (response, body) = response.into_parts();
            let bytes = match body::to_bytes(body).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    log::warn!("Could not read error body for {}", request["url"]);
                    let response = response.set_body(BoxBody::new(()));
                    return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                }
            };

            let enriched = match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(mut fields)) => {
                    if let Some(stack) = stack {
                        fields.insert("stack".to_string(), Value::String(stack));
                    }
                    fields.insert("request".to_string(), request);
                    serde_json::to_vec(&fields).unwrap_or_else(|_| bytes.to_vec())
                }
                _ => bytes.to_vec(),
            };

            let response = response.set_body(BoxBody::new(enriched));
            Ok(ServiceResponse::new(http_req, response).map_into_right_body())
        })
    }
}
