use amc_trainer::app::interactive::{run_session, RunOptions};
use amc_trainer::config::case_file;
use amc_trainer::domain::model::{AudioClip, Response};
use amc_trainer::utils::error::TrainerError;
use amc_trainer::utils::validation::{validate_file_extension, Validate};
use amc_trainer::utils::logger;
use amc_trainer::{
    CliConfig, GeminiProvider, ResponseMode, SessionRunner, Settings, TerminalPresenter,
    WhisperTranscriber,
};
use clap::Parser;
use std::sync::Arc;

fn exit_with(e: &TrainerError, context: &str) -> ! {
    tracing::error!("❌ {}: {} (Category: {:?})", context, e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code());
}

fn prefilled_response(cli: &CliConfig) -> amc_trainer::Result<Option<Response>> {
    if let Some(text) = &cli.answer {
        return Ok(Response::from_text(text.clone()));
    }
    if let Some(path) = &cli.answer_file {
        return Ok(Response::from_text(std::fs::read_to_string(path)?));
    }
    if let Some(path) = &cli.audio {
        validate_file_extension("audio", &path.to_string_lossy(), &["wav"])?;
        let bytes = std::fs::read(path)?;
        return Ok(Some(Response::Audio(AudioClip::wav(bytes))));
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting amc-trainer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading settings from: {}", path.display());
            Settings::from_file(path).unwrap_or_else(|e| exit_with(&e, "Failed to load settings"))
        }
        None => Settings::default(),
    };
    settings.apply_cli_overrides(&cli);

    if let Err(e) = settings.validate() {
        exit_with(&e, "Configuration validation failed");
    }

    let case = match settings.case_path() {
        Some(path) => {
            tracing::info!("📋 Loading case from: {}", path.display());
            case_file::load_case(path)
        }
        None => case_file::sample_case(),
    }
    .unwrap_or_else(|e| exit_with(&e, "Failed to load case"));

    let mode = settings.response_mode();
    tracing::info!("🩺 Response mode: {}, model: {}", mode, settings.model());

    let mut runner = SessionRunner::new(Arc::new(case), mode);

    // 憑證錯誤只在啟動時報告一次；病例照常顯示
    match settings.gemini_config().and_then(GeminiProvider::new) {
        Ok(provider) => runner = runner.with_provider(Arc::new(provider)),
        Err(e) => {
            tracing::error!("❌ Grading disabled: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            runner = runner.disable_grading(e.to_string());
        }
    }

    if mode == ResponseMode::Transcribe {
        runner = runner.with_transcriber(Arc::new(WhisperTranscriber::new(
            settings.whisper_config(),
        )));
    }

    let prefilled = if cli.has_prefilled_answer() {
        tracing::info!("📝 Using the answer given on the command line");
        prefilled_response(&cli).unwrap_or_else(|e| exit_with(&e, "Failed to read answer"))
    } else {
        None
    };

    let options = RunOptions {
        prefilled,
        auto_submit: cli.yes,
        reveal: cli.reveal,
        interactive: !cli.yes,
    };

    let mut presenter = TerminalPresenter::stdio();
    let outcome = run_session(&mut runner, &mut presenter, options).await?;

    if let Some(e) = outcome.error {
        tracing::error!(
            "❌ Grading failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        std::process::exit(e.severity().exit_code());
    }

    if outcome.verdict.is_some() {
        tracing::info!("✅ Assessment complete");
    }

    Ok(())
}
