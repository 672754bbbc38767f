//! Cloud Vision OCR backend
//!
//! Sends image bytes to the `images:annotate` endpoint with document text
//! detection and decodes the full text annotation.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::annotation::OcrResponse;
use super::OcrClient;
use crate::config::ServiceSettings;
use crate::error::ServiceError;
use crate::service;

const SERVICE: &str = "vision";

/// HTTP client for document text detection
#[derive(Clone)]
pub struct CloudVisionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    backoff: ExponentialBuilder,
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnnotateResponse {
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<OcrResponse>,
    error: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Status {
    code: i32,
    message: String,
}

impl CloudVisionClient {
    /// Create a client from service settings and an API key
    pub fn new(settings: &ServiceSettings, api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        Ok(Self {
            client: service::http_client(settings)?,
            endpoint: settings.vision_endpoint.clone(),
            api_key,
            backoff: service::backoff(settings),
        })
    }

    fn request_body(image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
            }],
        }
    }

    async fn send(&self, body: &AnnotateRequest) -> Result<AnnotateResponse, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(body)
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

/// Extract the single image result from a batch response
fn into_ocr_response(batch: AnnotateResponse) -> Result<OcrResponse, ServiceError> {
    let Some(result) = batch.responses.into_iter().next() else {
        return Ok(OcrResponse::default());
    };

    if let Some(status) = result.error.filter(|s| s.code != 0) {
        return Err(ServiceError::Api {
            service: SERVICE,
            code: status.code.to_string(),
            message: status.message,
        });
    }

    Ok(result.full_text_annotation.unwrap_or_default())
}

#[async_trait]
impl OcrClient for CloudVisionClient {
    async fn annotate(&self, image: &[u8]) -> Result<OcrResponse, ServiceError> {
        let body = Self::request_body(image);
        let batch = service::with_retry(SERVICE, self.backoff.clone(), || self.send(&body)).await?;
        let response = into_ocr_response(batch)?;

        debug!(
            "Vision returned {} pages, {} symbols",
            response.pages.len(),
            response.symbol_count()
        );
        Ok(response)
    }
}
