use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL_ID: &str = "stabilityai/stable-diffusion-3.5-large-turbo";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 5.0;

/// Constant-delay retry budget for the 503 "model loading" response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            retry_delay,
        }
    }

    /// Negative or non-finite delays collapse to zero.
    pub fn from_secs_f64(max_retries: u32, retry_delay_secs: f64) -> Self {
        let retry_delay = if retry_delay_secs.is_finite() && retry_delay_secs > 0.0 {
            Duration::from_secs_f64(retry_delay_secs)
        } else {
            Duration::ZERO
        };
        Self::new(max_retries, retry_delay)
    }

    /// A zero budget still makes one attempt.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub api_url: String,
    pub model_id: String,
    pub retry: RetryPolicy,
    pub timeout: Option<Duration>,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        HuggingFaceConfig {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }
}

impl HuggingFaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_token = env::var("HUGGINGFACE_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let api_url = env::var("HUGGINGFACE_API_URL").unwrap_or(defaults.api_url);
        let model_id = env::var("HUGGINGFACE_MODEL_ID").unwrap_or(defaults.model_id);
        let max_retries = env::var("HUGGINGFACE_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let retry_delay = env::var("HUGGINGFACE_RETRY_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_DELAY_SECS);
        let timeout = env::var("HUGGINGFACE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        HuggingFaceConfig {
            api_token,
            api_url,
            model_id,
            retry: RetryPolicy::from_secs_f64(max_retries, retry_delay),
            timeout,
        }
    }

    pub fn with_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full inference URL: `<api_url>/<model_id>`.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.model_id.trim_start_matches('/')
        )
    }
}
