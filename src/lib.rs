pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{gemini::GeminiProvider, terminal::TerminalPresenter, whisper::WhisperTranscriber};
pub use config::Settings;
pub use crate::core::session::{ResponseMode, SessionRunner, SessionState};
pub use utils::error::{Result, TrainerError};
