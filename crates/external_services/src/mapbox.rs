use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use campground_services::error::ExternalServiceError;
use campground_services::ports::Geocoder;
use campground_services::Geometry;

const MAPBOX_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Forward geocoding response from Mapbox
#[derive(Debug, Deserialize)]
pub struct MapboxResponse {
    /// Matches, best first
    #[serde(default)]
    pub features: Vec<MapboxFeature>,
}

/// A single geocoding match
#[derive(Debug, Deserialize)]
pub struct MapboxFeature {
    /// Human readable name of the match
    #[serde(default)]
    pub place_name: Option<String>,

    /// GeoJSON point of the match
    pub geometry: Geometry,
}

impl MapboxResponse {
    /// Geometry of the best match, if any
    pub fn into_first_geometry(self) -> Option<Geometry> {
        self.features.into_iter().next().map(|f| f.geometry)
    }
}

/// Client for the Mapbox Geocoding API
pub struct MapboxGeocoder {
    client: Client,
    base_url: String,
    access_token: String,
}

impl MapboxGeocoder {
    /// Create a new geocoder authenticating with `access_token`
    pub fn new(access_token: impl Into<String>) -> Result<Self, ExternalServiceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ExternalServiceError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: MAPBOX_BASE_URL.to_string(),
            access_token: access_token.into(),
        })
    }

    /// Points the client at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, query: &str) -> String {
        format!(
            "{}/{}.json?access_token={}&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            urlencoding::encode(&self.access_token)
        )
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward_geocode(&self, query: &str) -> Result<Option<Geometry>, ExternalServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        if self.access_token.is_empty() {
            return Err(ExternalServiceError::Configuration(
                "MAPBOX_TOKEN is not set".to_string(),
            ));
        }

        debug!("Geocoding location: {}", query);

        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| ExternalServiceError::Request(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Mapbox returned HTTP {} for {:?}", status, query);
            return Err(ExternalServiceError::Response(format!("HTTP {}", status)));
        }

        let body: MapboxResponse = response.json().await.map_err(|e| {
            ExternalServiceError::Response(format!("Failed to parse geocoding response: {}", e))
        })?;

        let geometry = body.into_first_geometry();
        if geometry.is_none() {
            debug!("No geocoding match for {}", query);
        }
        Ok(geometry)
    }
}
