use crate::core::session::ResponseMode;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[command(name = "amc-trainer")]
#[command(about = "AMC clinical exam trainer: present a case, capture your answer, get it graded")]
pub struct CliConfig {
    /// Path to TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to TOML case file (built-in sample case if omitted)
    #[arg(long)]
    pub case: Option<PathBuf>,

    /// How the answer is captured and sent for grading
    #[arg(long, value_enum)]
    pub mode: Option<ResponseMode>,

    #[arg(long, help = "Override the inference model id")]
    pub model: Option<String>,

    #[arg(long, help = "Override the inference endpoint base URL")]
    pub endpoint: Option<String>,

    /// Typed answer; skips the interactive prompt
    #[arg(long, conflicts_with_all = ["answer_file", "audio"])]
    pub answer: Option<String>,

    #[arg(long, conflicts_with = "audio", help = "Read the typed answer from a file")]
    pub answer_file: Option<PathBuf>,

    #[arg(long, help = "WAV recording of the spoken answer")]
    pub audio: Option<PathBuf>,

    #[arg(long, help = "Show the official rubric after grading")]
    pub reveal: bool,

    #[arg(short, long, help = "Submit without asking for confirmation")]
    pub yes: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long)]
    pub retry_attempts: Option<u32>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 有任何預先提供的答案就不進入互動模式
    pub fn has_prefilled_answer(&self) -> bool {
        self.answer.is_some() || self.answer_file.is_some() || self.audio.is_some()
    }
}

// 作答內容不進日誌
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("case", &self.case)
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("answer", &self.answer.as_ref().map(|_| "<redacted>"))
            .field("answer_file", &self.answer_file)
            .field("audio", &self.audio)
            .field("reveal", &self.reveal)
            .field("yes", &self.yes)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("retry_attempts", &self.retry_attempts)
            .field("log_json", &self.log_json)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_non_interactive_args() {
        let cli = CliConfig::try_parse_from([
            "amc-trainer",
            "--mode",
            "transcribe",
            "--audio",
            "answer.wav",
            "--yes",
            "--reveal",
        ])
        .unwrap();

        assert_eq!(cli.mode, Some(ResponseMode::Transcribe));
        assert!(cli.has_prefilled_answer());
        assert!(cli.yes && cli.reveal);
    }

    #[test]
    fn test_answer_and_audio_conflict() {
        assert!(CliConfig::try_parse_from([
            "amc-trainer",
            "--answer",
            "text",
            "--audio",
            "a.wav"
        ])
        .is_err());
    }

    #[test]
    fn test_defaults_are_interactive() {
        let cli = CliConfig::try_parse_from(["amc-trainer"]).unwrap();
        assert!(!cli.has_prefilled_answer());
        assert!(cli.mode.is_none());
    }

    #[test]
    fn test_debug_output_hides_typed_answer() {
        let cli = CliConfig::try_parse_from([
            "amc-trainer",
            "--verbose",
            "--answer",
            "SECRET STUDENT ANSWER",
        ])
        .unwrap();

        let logged = format!("{:?}", cli);
        assert!(!logged.contains("SECRET STUDENT ANSWER"));
        assert!(logged.contains("<redacted>"));
        assert!(logged.contains("verbose: true"));
    }
}
