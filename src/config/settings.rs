use crate::adapters::gemini::{self, GeminiConfig};
use crate::adapters::whisper::{self, WhisperConfig};
use crate::core::session::ResponseMode;
use crate::utils::error::{Result, TrainerError};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_RETRY_ATTEMPTS: u32 = 1;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_TRANSCRIPTION_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub transcription: TranscriptionSettings,
    /// 設定檔所在目錄；設定檔中的相對病例路徑以此為準
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderSettings {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionSettings {
    pub response_mode: Option<ResponseMode>,
    pub case_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptionSettings {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub model: Option<String>,
    pub scratch_dir: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TrainerError::IoError)?;
        let mut settings = Self::from_toml_str(&content)?;
        settings.base_dir = path.as_ref().parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| TrainerError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| TrainerError::config(format!("invalid placeholder pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn model(&self) -> &str {
        self.provider.model.as_deref().unwrap_or(gemini::DEFAULT_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        self.provider
            .endpoint
            .as_deref()
            .unwrap_or(gemini::DEFAULT_ENDPOINT)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.provider
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.session.response_mode.unwrap_or_default()
    }

    pub fn case_file(&self) -> Option<&str> {
        self.session.case_file.as_deref()
    }

    /// 病例檔的實際路徑：相對路徑接在設定檔目錄之後
    pub fn case_path(&self) -> Option<PathBuf> {
        let case_file = Path::new(self.case_file()?);
        match &self.base_dir {
            Some(base) if case_file.is_relative() => Some(base.join(case_file)),
            _ => Some(case_file.to_path_buf()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.provider
                .retry_attempts
                .unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            Duration::from_millis(
                self.provider
                    .retry_delay_ms
                    .unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ),
        )
    }

    /// 設定檔優先，其次 GEMINI_API_KEY、GOOGLE_API_KEY
    pub fn resolve_api_key(&self) -> Result<SecretString> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<SecretString>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = &self.provider.api_key {
            let value = key.expose_secret().trim();
            // 未替換的 ${VAR} 視為沒有設定
            if !value.is_empty() && !value.starts_with("${") {
                return Ok(SecretString::from(value.to_string()));
            }
        }

        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .map(|value| SecretString::from(value.trim().to_string()))
            .ok_or_else(|| TrainerError::MissingConfigError {
                field: API_KEY_ENV_VARS.join(" or "),
            })
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        Ok(GeminiConfig {
            endpoint: self.endpoint().to_string(),
            model: self.model().to_string(),
            api_key: self.resolve_api_key()?,
            timeout: Duration::from_secs(self.timeout_seconds()),
            retry: self.retry_policy(),
        })
    }

    pub fn whisper_config(&self) -> WhisperConfig {
        let t = &self.transcription;
        WhisperConfig {
            program: t
                .program
                .clone()
                .unwrap_or_else(|| whisper::DEFAULT_PROGRAM.to_string()),
            args: t.args.clone().unwrap_or_else(whisper::default_args),
            model: t
                .model
                .clone()
                .unwrap_or_else(|| whisper::DEFAULT_MODEL.to_string()),
            scratch_dir: t.scratch_dir.as_ref().map(PathBuf::from),
            timeout: Duration::from_secs(
                t.timeout_seconds
                    .unwrap_or(DEFAULT_TRANSCRIPTION_TIMEOUT_SECONDS),
            ),
        }
    }

    /// 命令列參數覆蓋設定檔
    #[cfg(feature = "cli")]
    pub fn apply_cli_overrides(&mut self, cli: &crate::config::cli::CliConfig) {
        if let Some(mode) = cli.mode {
            self.session.response_mode = Some(mode);
        }
        if let Some(case) = &cli.case {
            // 命令列路徑相對於目前工作目錄
            self.session.case_file = Some(case.to_string_lossy().into_owned());
            self.base_dir = None;
        }
        if let Some(model) = &cli.model {
            self.provider.model = Some(model.clone());
        }
        if let Some(endpoint) = &cli.endpoint {
            self.provider.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = cli.timeout_seconds {
            self.provider.timeout_seconds = Some(timeout);
        }
        if let Some(retries) = cli.retry_attempts {
            self.provider.retry_attempts = Some(retries);
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("provider.endpoint", self.endpoint())?;
        validate_non_empty_string("provider.model", self.model())?;
        validate_range("provider.timeout_seconds", self.timeout_seconds(), 1, 600)?;
        validate_range(
            "provider.retry_attempts",
            self.retry_policy().retry_attempts,
            0,
            5,
        )?;

        if let Some(case_file) = self.case_file() {
            validate_path("session.case_file", case_file)?;
        }

        if self.response_mode() == ResponseMode::Transcribe {
            let whisper = self.whisper_config();
            validate_non_empty_string("transcription.program", &whisper.program)?;
            if !whisper.args.iter().any(|arg| arg.contains("{audio}")) {
                return Err(TrainerError::InvalidConfigValueError {
                    field: "transcription.args".to_string(),
                    value: whisper.args.join(" "),
                    reason: "arguments must include the {audio} placeholder".to_string(),
                });
            }
        }

        Ok(())
    }
}
