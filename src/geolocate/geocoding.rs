//! Geocoding API client

use async_trait::async_trait;
use backon::ExponentialBuilder;
use serde::Deserialize;

use super::{Geocoder, LatLng};
use crate::config::ServiceSettings;
use crate::error::ServiceError;
use crate::service;

const SERVICE: &str = "geocoding";

/// HTTP client for address geocoding
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    backoff: ExponentialBuilder,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

impl GeocodingClient {
    pub fn new(settings: &ServiceSettings, api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        Ok(Self {
            client: service::http_client(settings)?,
            endpoint: settings.geocode_endpoint.clone(),
            api_key,
            backoff: service::backoff(settings),
        })
    }

    async fn send(&self, query: &str) -> Result<GeocodeResponse, ServiceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                service: SERVICE,
                source,
            })?;

        service::check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|source| ServiceError::Decode {
                service: SERVICE,
                source,
            })
    }
}

fn into_candidates(response: GeocodeResponse) -> Result<Vec<LatLng>, ServiceError> {
    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .map(|r| r.geometry.location)
            .collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        _ => Err(ServiceError::Api {
            service: SERVICE,
            code: response.status,
            message: response.error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn geocode(&self, query: &str) -> Result<Vec<LatLng>, ServiceError> {
        let response =
            service::with_retry(SERVICE, self.backoff.clone(), || self.send(query)).await?;
        into_candidates(response)
    }
}
