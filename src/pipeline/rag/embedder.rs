use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::pipeline::AgentError;

/// Embedding model abstraction.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError>;
    fn dimension(&self) -> usize;
}

/// OpenAI-compatible `/v1/embeddings` client.
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self, AgentError> {
        if api_key.trim().is_empty() {
            return Err(AgentError::Configuration(
                "embedding API key not configured".to_string(),
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            dimension,
            client,
            timeout_secs,
        })
    }

    /// Build from settings. A missing `OPENAI_API_KEY` is a configuration error.
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let key = settings.openai_api_key.as_deref().ok_or_else(|| {
            AgentError::Configuration("OPENAI_API_KEY missing".to_string())
        })?;
        Self::new(
            &settings.openai_base_url,
            key,
            &settings.embedding_model,
            settings.embedding_dim,
            settings.openai_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingModel for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::upstream(
                        "embedding",
                        format!("request timed out after {}s", self.timeout_secs),
                    )
                } else {
                    AgentError::upstream("embedding", e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AgentError::upstream(
                "embedding",
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        let raw = response
            .text()
            .map_err(|e| AgentError::upstream("embedding", e.to_string()))?;
        parse_embedding_response(&raw, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Extract the first embedding from a response body and check its dimension.
fn parse_embedding_response(raw: &str, expected_dim: usize) -> Result<Vec<f32>, AgentError> {
    let parsed: EmbeddingResponse = serde_json::from_str(raw)
        .map_err(|e| AgentError::upstream("embedding", format!("bad response: {e}")))?;

    let vector = parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| AgentError::upstream("embedding", "response contained no embedding"))?;

    if vector.len() != expected_dim {
        return Err(AgentError::upstream(
            "embedding",
            format!(
                "dimension mismatch: expected {expected_dim}, got {}",
                vector.len()
            ),
        ));
    }

    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_response() {
        let raw = r#"{"data":[{"embedding":[0.1,0.2,0.3]}],"model":"m"}"#;
        let v = parse_embedding_response(raw, 3).unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn parse_dimension_mismatch_is_upstream_error() {
        let raw = r#"{"data":[{"embedding":[0.1,0.2]}]}"#;
        let err = parse_embedding_response(raw, 1536).unwrap_err();
        assert!(matches!(err, AgentError::Upstream { service: "embedding", .. }));
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn parse_empty_data_is_upstream_error() {
        let err = parse_embedding_response(r#"{"data":[]}"#, 3).unwrap_err();
        assert!(matches!(err, AgentError::Upstream { .. }));
    }

    #[test]
    fn parse_garbage_is_upstream_error() {
        let err = parse_embedding_response("not json", 3).unwrap_err();
        assert!(matches!(err, AgentError::Upstream { .. }));
    }

    #[test]
    fn empty_key_is_configuration_error() {
        let result = OpenAiEmbedder::new("https://api.openai.com", "  ", "m", 3, 5);
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn from_settings_without_key_is_configuration_error() {
        let settings = Settings::default();
        let result = OpenAiEmbedder::from_settings(&settings);
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn unreachable_endpoint_is_upstream_error() {
        let embedder = OpenAiEmbedder::new("http://127.0.0.1:1/", "sk-test", "m", 3, 2).unwrap();
        assert_eq!(embedder.dimension(), 3);
        let err = embedder.embed("sleep").unwrap_err();
        assert!(matches!(err, AgentError::Upstream { service: "embedding", .. }));
    }
}
