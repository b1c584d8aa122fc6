//! Campground bodies arrive either as JSON or as `multipart/form-data`.
//!
//! Multipart text fields use bracket names (`campground[title]`,
//! `deleteImages[]`) and are folded into the same shape as the JSON body.
//! File parts named `images` are collected for upload.

use actix_multipart::{Field, Multipart};
use actix_web::{HttpRequest, http::header, web};
use futures_util::TryStreamExt;
use serde_json::{Map, Value};

use campground_services::ports::ImageUpload;
use campground_services::validation::CampgroundForm;

use crate::error::ApiError;
use crate::parse_body;

const MAX_JSON_BYTES: usize = 1024 * 1024;
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const IMAGE_FIELD: &str = "images";
const ALLOWED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// A parsed campground body and the files that came with it
pub(crate) struct CampgroundRequest {
    pub form: CampgroundForm,
    pub files: Vec<ImageUpload>,
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn too_large(what: &str) -> ApiError {
    ApiError::BadRequest(format!("{} is too large", what))
}

fn invalid_form_data(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid form data: {}", err))
}

/// Reads the body of `POST /campgrounds` or `PUT /campgrounds/{id}`
pub(crate) async fn read_campground_request(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<CampgroundRequest, ApiError> {
    if is_multipart(req) {
        read_multipart(req, payload).await
    } else {
        let body = read_json_body(payload).await?;
        Ok(CampgroundRequest {
            form: parse_body(&body)?,
            files: Vec::new(),
        })
    }
}

async fn read_json_body(mut payload: web::Payload) -> Result<web::BytesMut, ApiError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    {
        if body.len() + chunk.len() > MAX_JSON_BYTES {
            return Err(too_large("Request body"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn read_multipart(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<CampgroundRequest, ApiError> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut fields = Map::new();
    let mut files = Vec::new();

    while let Some(mut field) = multipart.try_next().await.map_err(invalid_form_data)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        match file_name {
            Some(original_name) if base_name(&name) == IMAGE_FIELD => {
                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_ascii_lowercase())
                    .unwrap_or_default();
                let bytes = read_field(&mut field, MAX_IMAGE_BYTES, "Image").await?;

                // browsers send an empty part when no file was picked
                if bytes.is_empty() && original_name.is_empty() {
                    continue;
                }
                if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
                    return Err(ApiError::BadRequest(
                        "Only JPEG and PNG images are allowed".to_string(),
                    ));
                }
                files.push(ImageUpload {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            Some(_) => {
                read_field(&mut field, MAX_IMAGE_BYTES, "Upload").await?;
            }
            None => {
                let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES, "Form field").await?;
                let value = String::from_utf8(bytes).map_err(invalid_form_data)?;
                assign(&mut fields, &name, value);
            }
        }
    }

    let form = serde_json::from_value(Value::Object(fields)).map_err(invalid_form_data)?;
    Ok(CampgroundRequest { form, files })
}

async fn read_field(field: &mut Field, limit: usize, what: &str) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(invalid_form_data)? {
        if bytes.len() + chunk.len() > limit {
            return Err(too_large(what));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// `campground[title]` -> `campground`
fn base_name(name: &str) -> &str {
    name.split_once('[').map_or(name, |(base, _)| base)
}

/// Places a text field into the JSON body shape.
///
/// `a[b]` nests, `a[]` and `a[0]` append, and `deleteImages` is always a list.
fn assign(fields: &mut Map<String, Value>, name: &str, value: String) {
    let base = base_name(name);
    if base.is_empty() {
        return;
    }
    let key = name
        .split_once('[')
        .map(|(_, rest)| rest.trim_end_matches(']'))
        .unwrap_or_default();

    let appends = base == "deleteImages" || key.chars().all(|c| c.is_ascii_digit());
    if key.is_empty() && base != "deleteImages" {
        fields.insert(base.to_string(), Value::String(value));
    } else if appends {
        let entry = fields
            .entry(base.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(Value::String(value));
        }
    } else {
        let entry = fields
            .entry(base.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(nested) = entry {
            nested.insert(key.to_string(), Value::String(value));
        }
    }
}
