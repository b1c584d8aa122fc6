use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use campground_services::entities::Image;
use campground_services::error::ExternalServiceError;
use campground_services::ports::{ImageStorage, ImageUpload};

const CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
/// Folder every upload lands in; filenames are `YelpCamp/<public id>`
pub const UPLOAD_FOLDER: &str = "YelpCamp";
const ALLOWED_FORMATS: &str = "jpeg,png,jpg";

/// Credentials for the Cloudinary upload API
#[derive(Debug, Clone)]
pub struct CloudinaryCredentials {
    /// Account cloud name
    pub cloud_name: String,
    /// API key
    pub api_key: String,
    /// API secret, used only for signing
    pub api_secret: String,
}

impl CloudinaryCredentials {
    fn is_complete(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Stores and deletes images through the Cloudinary upload API
pub struct CloudinaryImageStore {
    client: Client,
    base_url: String,
    credentials: CloudinaryCredentials,
}

impl CloudinaryImageStore {
    /// Create a new client for the given account
    pub fn new(credentials: CloudinaryCredentials) -> Result<Self, ExternalServiceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ExternalServiceError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: CLOUDINARY_BASE_URL.to_string(),
            credentials,
        })
    }

    /// Points the client at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn destroy_url(&self) -> String {
        self.endpoint("destroy")
    }

    fn upload_url(&self) -> String {
        self.endpoint("upload")
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.base_url.trim_end_matches('/'),
            self.credentials.cloud_name,
            action
        )
    }

    fn require_credentials(&self) -> Result<(), ExternalServiceError> {
        if self.credentials.is_complete() {
            Ok(())
        } else {
            Err(ExternalServiceError::Configuration(
                "Cloudinary credentials are not set".to_string(),
            ))
        }
    }

    /// Signed text fields of an upload request
    fn upload_fields(&self, timestamp: &str) -> Vec<(&'static str, String)> {
        let signature = self.sign(&[
            ("allowed_formats", ALLOWED_FORMATS),
            ("folder", UPLOAD_FOLDER),
            ("timestamp", timestamp),
        ]);

        vec![
            ("allowed_formats", ALLOWED_FORMATS.to_string()),
            ("folder", UPLOAD_FOLDER.to_string()),
            ("timestamp", timestamp.to_string()),
            ("api_key", self.credentials.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ]
    }

    /// Signs request parameters: sorted `key=value` pairs joined with `&`,
    /// followed by the secret, hashed with SHA-256.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.credentials.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ImageStorage for CloudinaryImageStore {
    async fn upload(&self, file: ImageUpload) -> Result<Image, ExternalServiceError> {
        self.require_credentials()?;

        let timestamp = Utc::now().timestamp().to_string();
        let part = Part::bytes(file.bytes)
            .file_name(file.original_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                ExternalServiceError::Request(format!("Invalid content type: {}", e))
            })?;

        let form = self
            .upload_fields(&timestamp)
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", part);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExternalServiceError::Request(format!("Image upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            warn!("Cloudinary rejected upload of {}: {}", file.original_name, message);
            return Err(ExternalServiceError::Response(message));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            ExternalServiceError::Response(format!("Failed to parse upload response: {}", e))
        })?;

        debug!("Uploaded {} as {}", file.original_name, body.public_id);
        Ok(Image::new(body.secure_url, body.public_id))
    }

    async fn delete(&self, filename: &str) -> Result<(), ExternalServiceError> {
        self.require_credentials()?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", filename), ("timestamp", &timestamp)]);

        let form = [
            ("public_id", filename),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.credentials.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.destroy_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| ExternalServiceError::Request(format!("Image delete failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Cloudinary returned HTTP {} deleting {}", status, filename);
            return Err(ExternalServiceError::Response(format!("HTTP {}", status)));
        }

        let body: DestroyResponse = response.json().await.map_err(|e| {
            ExternalServiceError::Response(format!("Failed to parse destroy response: {}", e))
        })?;

        match body.result.as_str() {
            "ok" => {
                debug!("Deleted image {}", filename);
                Ok(())
            }
            "not found" => {
                debug!("Image {} was already gone", filename);
                Ok(())
            }
            other => Err(ExternalServiceError::Response(format!(
                "Unexpected destroy result: {}",
                other
            ))),
        }
    }
}
