use thiserror::Error;
use uuid::Uuid;

/// Number of payload bytes kept in a [`GenerationError::DecodeError`] preview.
pub const PREVIEW_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid prompt: prompt must not be empty")]
    InvalidPrompt,

    #[error("Model still loading after {attempts} attempts: {body}")]
    ModelLoadingExhausted { attempts: u32, body: String },

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error(
        "Failed to identify image, possibly received non-image content ({reason}). Response preview: {}",
        String::from_utf8_lossy(preview)
    )]
    DecodeError { preview: Vec<u8>, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
}

impl GenerationError {
    /// Builds a decode failure keeping at most [`PREVIEW_LEN`] bytes of the payload.
    pub fn decode(payload: &[u8], reason: impl Into<String>) -> Self {
        let end = payload.len().min(PREVIEW_LEN);
        GenerationError::DecodeError {
            preview: payload[..end].to_vec(),
            reason: reason.into(),
        }
    }

    /// Only the 503 "model loading" signal is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::ModelLoadingExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_preview_is_capped() {
        let payload = vec![b'x'; 500];
        match GenerationError::decode(&payload, "bad") {
            GenerationError::DecodeError { preview, reason } => {
                assert_eq!(preview.len(), PREVIEW_LEN);
                assert_eq!(reason, "bad");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_payload_preview_kept_whole() {
        let payload = [1u8, 2, 3];
        match GenerationError::decode(&payload, "bad") {
            GenerationError::DecodeError { preview, .. } => assert_eq!(preview, payload),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = GenerationError::ApiError {
            status: 404,
            body: "Not Found".into(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status 404: Not Found"
        );
        assert!(!err.is_retryable());
        assert!(GenerationError::ModelLoadingExhausted {
            attempts: 5,
            body: String::new()
        }
        .is_retryable());
    }
}
