//! Entity extraction via the Natural Language `analyzeEntities` endpoint

use async_trait::async_trait;
use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};

use super::EntityExtractor;
use crate::config::ServiceSettings;
use crate::error::ServiceError;
use crate::service;

const SERVICE: &str = "language";

/// HTTP client for entity analysis
#[derive(Clone)]
pub struct CloudLanguageClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    backoff: ExponentialBuilder,
    entity_types: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyzeResponse {
    entities: Vec<Entity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entity {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

impl CloudLanguageClient {
    /// Create a client keeping entities of the given types
    pub fn new(
        settings: &ServiceSettings,
        api_key: impl Into<String>,
        entity_types: Vec<String>,
    ) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        Ok(Self {
            client: service::http_client(settings)?,
            endpoint: settings.language_endpoint.clone(),
            api_key,
            backoff: service::backoff(settings),
            entity_types,
        })
    }

    async fn send(&self, text: &str) -> Result<AnalyzeResponse, ServiceError> {
        let body = AnalyzeRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: text,
            },
            encoding_type: "UTF32",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&body)
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

/// Names of matching entities, each followed by a space
fn collect_names(entities: &[Entity], entity_types: &[String]) -> String {
    let mut names = String::new();
    for entity in entities
        .iter()
        .filter(|e| entity_types.iter().any(|t| t == &e.kind))
    {
        names.push_str(&entity.name);
        names.push(' ');
    }
    names
}

#[async_trait]
impl EntityExtractor for CloudLanguageClient {
    async fn addresses(&self, text: &str) -> Result<String, ServiceError> {
        let response =
            service::with_retry(SERVICE, self.backoff.clone(), || self.send(text)).await?;
        Ok(collect_names(&response.entities, &self.entity_types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Vec<String> {
        vec!["ADDRESS".to_string(), "LOCATION".to_string()]
    }

    #[test]
    fn test_collect_keeps_addresses_and_locations() {
        let response: AnalyzeResponse = serde_json::from_str(
            r#"{"entities": [
                {"name": "Harbor Road", "type": "ADDRESS", "salience": 0.4},
                {"name": "John Smith", "type": "PERSON"},
                {"name": "Boston", "type": "LOCATION"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(collect_names(&response.entities, &types()), "Harbor Road Boston ");
    }

    #[test]
    fn test_collect_nothing_matching() {
        let response: AnalyzeResponse =
            serde_json::from_str(r#"{"entities": [{"name": "1890", "type": "NUMBER"}]}"#).unwrap();
        assert_eq!(collect_names(&response.entities, &types()), "");

        let response: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(collect_names(&response.entities, &types()), "");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(AnalyzeRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: "Main St",
            },
            encoding_type: "UTF32",
        })
        .unwrap();

        assert_eq!(body["document"]["type"], "PLAIN_TEXT");
        assert_eq!(body["document"]["content"], "Main St");
        assert_eq!(body["encodingType"], "UTF32");
    }
}
