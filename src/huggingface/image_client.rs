use crate::{
    config::RetryPolicy,
    error::{GenerationError, Result},
    huggingface::transport::InferenceTransport,
    logger,
    models::{decode_image, GeneratedImage, GenerationRequest, ImageBytes},
};
use std::sync::Arc;
use std::time::Duration;

const MODEL_LOADING: u16 = 503;

/// Attempt bookkeeping for a single `generate` call.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    waited: Duration,
}

#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn InferenceTransport>,
    endpoint: String,
    token: String,
    retry: RetryPolicy,
}

impl ImageClient {
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        endpoint: impl Into<String>,
        token: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            token: token.into(),
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<ImageBytes> {
        self.generate_with_policy(request, self.retry).await
    }

    /// Posts the prompt, retrying with a constant delay while the model is loading (503).
    ///
    /// Any other failure status or a transport failure ends the call on the spot.
    pub async fn generate_with_policy(
        &self,
        request: &GenerationRequest,
        policy: RetryPolicy,
    ) -> Result<ImageBytes> {
        let payload = serde_json::to_value(request)
            .map_err(|e| GenerationError::EncodeError(e.to_string()))?;
        let max_attempts = policy.attempts();
        let mut state = RetryState::default();

        log::info!("Generating image with endpoint: {}", self.endpoint);
        log::debug!("Prompt: {}", request.prompt());

        loop {
            state.attempt += 1;
            let timer = logger::timer("image generation");

            let response = self
                .transport
                .post_json(&self.endpoint, &self.token, &payload)
                .await?;

            if response.is_success() {
                let elapsed = timer.finish();
                log::info!(
                    "Image generated in {:.2} seconds ({} bytes, attempt {}/{})",
                    elapsed.as_secs_f64(),
                    response.body.len(),
                    state.attempt,
                    max_attempts
                );
                return Ok(ImageBytes::new(response.body));
            }
            timer.cancel();

            if response.status != MODEL_LOADING {
                log::error!("API request failed with status {}", response.status);
                return Err(GenerationError::ApiError {
                    status: response.status,
                    body: response.body_text(),
                });
            }

            if state.attempt >= max_attempts {
                log::error!(
                    "Model still loading after {} attempts ({:.2}s spent waiting)",
                    state.attempt,
                    state.waited.as_secs_f64()
                );
                return Err(GenerationError::ModelLoadingExhausted {
                    attempts: state.attempt,
                    body: response.body_text(),
                });
            }

            log::warn!(
                "Model loading... Retrying in {} seconds... (attempt {}/{})",
                policy.retry_delay.as_secs_f64(),
                state.attempt,
                max_attempts
            );
            tokio::time::sleep(policy.retry_delay).await;
            state.waited += policy.retry_delay;
        }
    }

    /// Generates and decodes in one step.
    pub async fn generate_image(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let bytes = self.generate(request).await?;
        decode_image(&bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::huggingface::transport::TransportResponse;
    use crate::models::image::png_fixture;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Debug, Clone)]
    pub(crate) struct RecordedCall {
        pub url: String,
        pub token: String,
        pub body: serde_json::Value,
    }

    /// Replays scripted outcomes in order and records every call.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<TransportResponse>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<TransportResponse>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceTransport for ScriptedTransport {
        async fn post_json(
            &self,
            url: &str,
            token: &str,
            body: &serde_json::Value,
        ) -> Result<TransportResponse> {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                token: token.to_string(),
                body: body.clone(),
            });
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("transport called more often than scripted"))
        }
    }

    pub(crate) fn respond(status: u16, body: &[u8]) -> Result<TransportResponse> {
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn loading() -> Result<TransportResponse> {
        respond(503, br#"{"error":"Model is currently loading"}"#)
    }

    fn client(
        transport: Arc<ScriptedTransport>,
        max_retries: u32,
        delay_secs: f64,
    ) -> ImageClient {
        ImageClient::new(
            transport,
            "http://inference.test/models/acme/tiny",
            "hf_test_token",
            RetryPolicy::from_secs_f64(max_retries, delay_secs),
        )
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("a whale leaping over the moon").unwrap()
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let png = png_fixture(4, 4);
        let transport = ScriptedTransport::new(vec![respond(200, &png)]);
        let client = client(transport.clone(), 5, 0.0);

        let bytes = client.generate(&request()).await.unwrap();
        assert_eq!(bytes.as_slice(), png.as_slice());

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://inference.test/models/acme/tiny");
        assert_eq!(calls[0].token, "hf_test_token");
        assert_eq!(
            calls[0].body,
            serde_json::json!({ "inputs": "a whale leaping over the moon" })
        );
    }

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let png = png_fixture(3, 2);
        let mut script: Vec<_> = (0..4).map(|_| loading()).collect();
        script.push(respond(200, &png));
        let transport = ScriptedTransport::new(script);
        let client = client(transport.clone(), 5, 0.0);

        let bytes = client.generate(&request()).await.unwrap();
        assert_eq!(bytes.as_slice(), png.as_slice());
        assert_eq!(transport.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_loading_exhausts_retries() {
        let transport = ScriptedTransport::new((0..5).map(|_| loading()).collect());
        let client = client(transport.clone(), 5, 0.0);

        match client.generate(&request()).await {
            Err(GenerationError::ModelLoadingExhausted { attempts, body }) => {
                assert_eq!(attempts, 5);
                assert!(body.contains("currently loading"));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_other_status_fails_without_retry() {
        let transport = ScriptedTransport::new(vec![respond(404, b"Not Found")]);
        let client = client(transport.clone(), 5, 0.0);

        match client.generate(&request()).await {
            Err(GenerationError::ApiError { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Not Found");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_error_after_loading_is_not_retried() {
        let transport =
            ScriptedTransport::new(vec![loading(), respond(401, b"{\"error\":\"bad token\"}")]);
        let client = client(transport.clone(), 5, 0.0);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::ApiError { status: 401, .. }));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(GenerationError::TransportError(
            "connection refused".into(),
        ))]);
        let client = client(transport.clone(), 5, 0.0);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::TransportError(_)));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_makes_one_attempt() {
        let transport = ScriptedTransport::new(vec![loading()]);
        let client = client(transport.clone(), 0, 0.0);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ModelLoadingExhausted { attempts: 1, .. }
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_constant_delay_between_attempts() {
        let png = png_fixture(2, 2);
        let transport = ScriptedTransport::new(vec![loading(), loading(), respond(200, &png)]);
        let client = client(transport.clone(), 5, 0.01);

        let started = Instant::now();
        client.generate(&request()).await.unwrap();
        let elapsed = started.elapsed();

        // Two sleeps of 10ms; exponential growth would already exceed the upper bound.
        assert!(elapsed >= Duration::from_millis(20), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(500), "elapsed {elapsed:?}");
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_explicit_policy_overrides_default() {
        let transport = ScriptedTransport::new(vec![loading(), loading()]);
        let client = client(transport.clone(), 5, 0.0);

        let err = client
            .generate_with_policy(&request(), RetryPolicy::new(2, Duration::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ModelLoadingExhausted { attempts: 2, .. }
        ));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_image_decodes() {
        let transport = ScriptedTransport::new(vec![respond(200, &png_fixture(9, 5))]);
        let client = client(transport, 5, 0.0);

        let image = client.generate_image(&request()).await.unwrap();
        assert_eq!((image.width(), image.height()), (9, 5));
    }

    #[tokio::test]
    async fn test_generate_image_rejects_non_image_body() {
        let transport = ScriptedTransport::new(vec![respond(200, b"<html>oops</html>")]);
        let client = client(transport, 5, 0.0);

        match client.generate_image(&request()).await {
            Err(GenerationError::DecodeError { preview, .. }) => {
                assert_eq!(preview, b"<html>oops</html>".to_vec())
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
