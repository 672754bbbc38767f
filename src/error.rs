//! Error types
//!
//! `ServiceError` covers the external collaborators (OCR, entity extraction,
//! geocoding, source download). `TilerError` is what a tiled OCR call
//! surfaces to its caller: any failure anywhere in the recursion tree ends up
//! here as a single error.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to an external service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure or timeout
    #[error("request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success HTTP status
    #[error("{service} responded with HTTP {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },
    /// The service answered but reported an error object in its payload
    #[error("{service} returned error {code}: {message}")]
    Api {
        service: &'static str,
        code: String,
        message: String,
    },
    /// The response body could not be decoded
    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// No API key was provided
    #[error("no API key configured (use --api-key or GEOLOCALIZATION_API_KEY)")]
    MissingApiKey,
}

impl ServiceError {
    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ServiceError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            ServiceError::Api { .. } | ServiceError::Decode { .. } | ServiceError::MissingApiKey => {
                false
            }
        }
    }
}

/// Errors produced by the tiled OCR driver
#[derive(Debug, Error)]
pub enum TilerError {
    /// Missing or empty source, bad overlap fraction, zero-area image
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An OCR call failed somewhere in the recursion tree
    #[error("external service error: {0}")]
    ExternalService(#[from] ServiceError),
    /// Splitting cannot bring the tile under the size budget
    #[error("tile {width}x{height} at depth {depth} is still over the size budget and cannot be split further")]
    TooLarge { width: u32, height: u32, depth: u32 },
    /// Decoding or encoding an image failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Reading a local source file failed
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the full geolocalization pipeline
#[derive(Debug, Error)]
pub enum GeolocateError {
    #[error(transparent)]
    Ocr(#[from] TilerError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let throttled = ServiceError::Status {
            service: "vision",
            status: 429,
            message: String::new(),
        };
        let unavailable = ServiceError::Status {
            service: "vision",
            status: 503,
            message: String::new(),
        };
        let bad_request = ServiceError::Status {
            service: "vision",
            status: 400,
            message: String::new(),
        };

        assert!(throttled.is_transient());
        assert!(unavailable.is_transient());
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_api_errors_are_not_retried() {
        let err = ServiceError::Api {
            service: "vision",
            code: "3".to_string(),
            message: "Bad image data".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!ServiceError::MissingApiKey.is_transient());
    }

    #[test]
    fn test_service_error_wraps_into_tiler_error() {
        let err: TilerError = ServiceError::MissingApiKey.into();
        assert!(matches!(err, TilerError::ExternalService(ServiceError::MissingApiKey)));
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn test_too_large_message() {
        let err = TilerError::TooLarge {
            width: 10,
            height: 20,
            depth: 3,
        };
        assert!(err.to_string().contains("10x20"));
        assert!(err.to_string().contains("depth 3"));
    }
}
