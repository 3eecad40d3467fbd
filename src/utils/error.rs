use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("No response captured: {message}")]
    EmptyInputError { message: String },

    #[error("Transcription failed: {message}")]
    TranscriptionError { message: String },

    #[error("Inference request failed: {message}")]
    InferenceError {
        message: String,
        status: Option<u16>,
        transient: bool,
    },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Transcription,
    Inference,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程序結束碼：0 成功、1 設定、2 轉錄或推論、3 系統、4 沒有作答
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Low => 4,
            Self::Medium => 2,
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl TrainerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInputError {
            message: message.into(),
        }
    }

    pub fn transcription(message: impl Into<String>) -> Self {
        Self::TranscriptionError {
            message: message.into(),
        }
    }

    /// 永久性推論錯誤 (不重試)
    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceError {
            message: message.into(),
            status: None,
            transient: false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::EmptyInputError { .. } => ErrorCategory::Input,
            Self::TranscriptionError { .. } => ErrorCategory::Transcription,
            Self::InferenceError { .. } | Self::HttpError(_) => ErrorCategory::Inference,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Transcription | ErrorCategory::Inference => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否為可重試的暫時性錯誤 (429、5xx、逾時、連線失敗)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InferenceError { transient, .. } => *transient,
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigurationError { message } => {
                format!("Grading is unavailable: {}", message)
            }
            Self::MissingConfigError { field } => {
                format!("Grading is unavailable: '{}' is not configured", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::EmptyInputError { .. } => "Please enter your response first.".to_string(),
            Self::TranscriptionError { message } => {
                format!("Could not transcribe your recording: {}", message)
            }
            Self::InferenceError { message, .. } => {
                format!("The examiner model could not grade this attempt: {}", message)
            }
            Self::HttpError(e) => {
                format!("The examiner model could not grade this attempt: {}", e)
            }
            Self::IoError(e) => format!("File error: {}", e),
            Self::SerializationError(e) => format!("Unexpected data format: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Set GEMINI_API_KEY (or [provider].api_key) and check the settings file"
            }
            ErrorCategory::Input => "Type an answer or attach a WAV recording, then submit again",
            ErrorCategory::Transcription => {
                "Check the recording is a non-empty WAV file and the transcription program is installed"
            }
            ErrorCategory::Inference => {
                "Check network access, quota and the model id, then submit again"
            }
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy_categories() {
        assert_eq!(
            TrainerError::config("no key").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            TrainerError::empty_input("nothing").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            TrainerError::transcription("bad wav").category(),
            ErrorCategory::Transcription
        );
        assert_eq!(
            TrainerError::inference("boom").category(),
            ErrorCategory::Inference
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(TrainerError::empty_input("x").severity() < TrainerError::config("x").severity());
        assert_eq!(
            TrainerError::inference("x").severity(),
            ErrorSeverity::Medium
        );
    }

    #[test]
    fn test_exit_code_follows_severity() {
        assert_eq!(TrainerError::config("x").severity().exit_code(), 1);
        let missing = TrainerError::MissingConfigError {
            field: "GEMINI_API_KEY".to_string(),
        };
        assert_eq!(missing.severity().exit_code(), 1);
        assert_eq!(TrainerError::inference("x").severity().exit_code(), 2);
        assert_eq!(TrainerError::transcription("x").severity().exit_code(), 2);
        let io = TrainerError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.severity().exit_code(), 3);
        assert_eq!(TrainerError::empty_input("x").severity().exit_code(), 4);
    }

    #[test]
    fn test_transient_flag() {
        let transient = TrainerError::InferenceError {
            message: "quota".to_string(),
            status: Some(429),
            transient: true,
        };
        assert!(transient.is_transient());
        assert!(!TrainerError::inference("bad request").is_transient());
        assert!(!TrainerError::transcription("x").is_transient());
    }

    #[test]
    fn test_inference_message_keeps_underlying_text() {
        let err = TrainerError::inference("connection reset by peer");
        assert!(err.to_string().contains("connection reset by peer"));
        assert!(err.user_friendly_message().contains("connection reset by peer"));
    }
}
