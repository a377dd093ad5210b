mod backend;
mod classifier;
pub mod decode;
mod gemini;
mod generator;
pub mod schema;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{GenerationRequest, GenerativeModel, ModelError, ModelReply, ReplyPurpose};
pub use classifier::{ClassifyError, IntentClassifier};
pub use decode::{decode_reply, DecodeError, Decoded};
pub use gemini::{GeminiModel, DEFAULT_GEMINI_API_BASE};
pub use generator::{GenerateError, PlanGenerator};
