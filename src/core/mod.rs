pub mod prompt;
pub mod session;

pub use crate::domain::model::{AudioClip, AudioEncoding, Case, Response, Verdict};
pub use crate::domain::ports::{InferenceProvider, Presenter, Transcriber};
pub use crate::utils::error::Result;
