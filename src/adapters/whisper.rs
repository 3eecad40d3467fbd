use crate::domain::model::AudioClip;
use crate::domain::ports::Transcriber;
use crate::utils::error::{Result, TrainerError};
use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const DEFAULT_PROGRAM: &str = "whisper-cli";
/// 輕量模型
pub const DEFAULT_MODEL: &str = "base";

pub fn default_args() -> Vec<String> {
    ["-m", "{model}", "-f", "{audio}", "-nt"]
        .iter()
        .map(|arg| arg.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    pub program: String,
    /// `{audio}` 與 `{model}` 會被替換
    pub args: Vec<String>,
    pub model: String,
    pub scratch_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: default_args(),
            model: DEFAULT_MODEL.to_string(),
            scratch_dir: None,
            timeout: Duration::from_secs(300),
        }
    }
}

/// 呼叫本機 whisper 指令；模型實例由外部程式持有，這裡沒有可變狀態，可在多個 session 間共用
pub struct WhisperTranscriber {
    config: WhisperConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavSummary {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f32,
}

/// 檢查錄音是可讀的 WAV 容器
pub fn inspect_wav(bytes: &[u8]) -> Result<WavSummary> {
    if bytes.is_empty() {
        return Err(TrainerError::transcription("audio buffer is empty"));
    }

    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        TrainerError::transcription(format!("recording is not a readable WAV file: {}", e))
    })?;
    let spec = reader.spec();
    let frames = reader.duration();

    Ok(WavSummary {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration_secs: if spec.sample_rate == 0 {
            0.0
        } else {
            frames as f32 / spec.sample_rate as f32
        },
    })
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    fn command_args(&self, audio_path: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{audio}", audio_path)
                    .replace("{model}", &self.config.model)
            })
            .collect()
    }

    fn write_scratch_file(&self, audio: &AudioClip) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("amc-response-").suffix(".wav");
        let mut file = match &self.config.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| TrainerError::transcription(format!("cannot create scratch file: {}", e)))?;

        file.write_all(&audio.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| TrainerError::transcription(format!("cannot write scratch file: {}", e)))?;
        Ok(file)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String> {
        let summary = inspect_wav(&audio.bytes)?;
        tracing::info!(
            "🎙️ Transcribing {:.1}s of audio ({} Hz, {} ch) with model '{}'",
            summary.duration_secs,
            summary.sample_rate,
            summary.channels,
            self.config.model
        );

        // NamedTempFile 在離開作用域時刪除，成功或失敗都一樣
        let scratch = self.write_scratch_file(audio)?;
        let audio_path = scratch.path().to_string_lossy().into_owned();
        let args = self.command_args(&audio_path);
        tracing::debug!("Running transcription command: {} {:?}", self.config.program, args);

        let started = Instant::now();
        let output = tokio::time::timeout(
            self.config.timeout,
            tokio::process::Command::new(&self.config.program)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            TrainerError::transcription(format!(
                "{} did not finish within {}s",
                self.config.program,
                self.config.timeout.as_secs()
            ))
        })?
        .map_err(|e| {
            TrainerError::transcription(format!("cannot run {}: {}", self.config.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrainerError::transcription(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(
            "Transcription finished in {:?} ({} chars)",
            started.elapsed(),
            transcript.len()
        );

        Ok(transcript)
    }
}
