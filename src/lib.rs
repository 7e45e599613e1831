pub mod config;
pub mod error;
pub mod huggingface;
pub mod logger;
pub mod models;
pub mod session;

pub use config::{HuggingFaceConfig, RetryPolicy};
pub use error::{GenerationError, Result};
pub use huggingface::{HuggingFaceClient, ImageClient, InferenceTransport, ReqwestTransport};
pub use models::{
    compose_prompt, decode_image, GeneratedImage, GenerationRequest, ImageBytes, PromptSelection,
    Style, EXAMPLE_PROMPTS,
};
pub use session::{SessionId, SessionState, SessionStore};
