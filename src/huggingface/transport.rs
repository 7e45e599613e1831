use crate::error::{GenerationError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Status and body of one inference call, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One POST of a JSON body with a bearer credential.
///
/// Non-2xx statuses are returned as responses, only network-level failures are errors.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::ConfigError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl InferenceTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        log::debug!("Inference endpoint answered {} ({} bytes)", status, body.len());

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok = TransportResponse {
            status: 204,
            body: Vec::new(),
        };
        let loading = TransportResponse {
            status: 503,
            body: b"{\"error\":\"loading\"}".to_vec(),
        };
        assert!(ok.is_success());
        assert!(!loading.is_success());
        assert_eq!(loading.body_text(), "{\"error\":\"loading\"}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::new(Some(Duration::from_secs(2))).unwrap();
        let result = transport
            .post_json(
                "http://127.0.0.1:9/models/none",
                "hf_test",
                &serde_json::json!({ "inputs": "x" }),
            )
            .await;
        assert!(matches!(result, Err(GenerationError::TransportError(_))));
    }
}
