use amc_trainer::adapters::gemini::{GeminiConfig, GeminiProvider};
use amc_trainer::adapters::whisper::{WhisperConfig, WhisperTranscriber};
use amc_trainer::app::interactive::{run_session, RunOptions};
use amc_trainer::config::case_file;
use amc_trainer::domain::model::{AudioClip, Case, Response};
use amc_trainer::utils::retry::RetryPolicy;
use amc_trainer::{ResponseMode, SessionRunner, SessionState, TerminalPresenter, TrainerError};
use httpmock::prelude::*;
use secrecy::SecretString;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn fatigue_case() -> Arc<Case> {
    Arc::new(Case::new(
        "Patient has fatigue",
        vec!["Take history".to_string()],
        "Diagnosis: Anemia",
    ))
}

fn provider_for(server: &MockServer) -> Arc<GeminiProvider> {
    let mut config = GeminiConfig::new(SecretString::from("test-key".to_string()));
    config.endpoint = server.base_url();
    config.retry = RetryPolicy::none();
    Arc::new(GeminiProvider::new(config).unwrap())
}

fn scripted(input: &str) -> TerminalPresenter<Cursor<Vec<u8>>, Vec<u8>> {
    TerminalPresenter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn verdict_body(text: &str) -> serde_json::Value {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
}

#[tokio::test]
async fn test_interactive_text_session_end_to_end() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("Patient has fatigue")
            .body_contains("Take history")
            .body_contains("Diagnosis: Anemia")
            .body_contains("I asked about diet");
        then.status(200)
            .json_body(verdict_body("## Verdict\nPASS"));
    });

    let mut runner =
        SessionRunner::new(fatigue_case(), ResponseMode::Text).with_provider(provider_for(&server));
    // 作答 -> 空行結束 -> 送出 -> 顯示評分標準
    let mut presenter = scripted("I asked about diet\n\ny\ny\n");

    let options = RunOptions {
        interactive: true,
        ..RunOptions::default()
    };
    let outcome = run_session(&mut runner, &mut presenter, options)
        .await
        .unwrap();

    api_mock.assert();
    assert!(outcome.error.is_none());
    assert_eq!(outcome.verdict.unwrap().text, "## Verdict\nPASS");
    assert!(outcome.rubric_revealed);
    assert_eq!(runner.state(), SessionState::VerdictShown);

    let screen = String::from_utf8(presenter.into_output()).unwrap();
    assert!(screen.contains("Patient has fatigue"));
    assert!(screen.contains("i. Take history"));
    assert!(screen.contains("## Verdict\nPASS"));
    assert!(screen.contains("--- Official Rubric & Answer ---\nDiagnosis: Anemia"));
}

#[tokio::test]
async fn test_submit_without_answer_never_calls_provider() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(verdict_body("unused"));
    });

    let mut runner =
        SessionRunner::new(fatigue_case(), ResponseMode::Text).with_provider(provider_for(&server));
    let mut presenter = scripted("");

    let options = RunOptions {
        auto_submit: true,
        ..RunOptions::default()
    };
    let outcome = run_session(&mut runner, &mut presenter, options)
        .await
        .unwrap();

    api_mock.assert_hits(0);
    assert!(matches!(
        outcome.error,
        Some(TrainerError::EmptyInputError { .. })
    ));
    assert_eq!(runner.state(), SessionState::Idle);

    let screen = String::from_utf8(presenter.into_output()).unwrap();
    assert!(screen.contains("Please enter your response first."));
}

#[tokio::test]
async fn test_network_failure_leaves_previous_verdict() {
    let server = MockServer::start();
    let mut ok_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(verdict_body("first verdict"));
    });

    let mut runner =
        SessionRunner::new(fatigue_case(), ResponseMode::Text).with_provider(provider_for(&server));
    runner.capture_response(Response::from_text("first answer"));
    runner.submit().await.unwrap();
    ok_mock.delete();

    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(500).json_body(serde_json::json!({
            "error": {"code": 500, "message": "Internal error encountered."}
        }));
    });

    runner.capture_response(Response::from_text("second answer"));
    let err = runner.submit().await.unwrap_err();

    assert!(matches!(err, TrainerError::InferenceError { .. }));
    assert!(err.to_string().contains("Internal error encountered."));
    assert_eq!(runner.state(), SessionState::Idle);
    assert_eq!(runner.verdict().unwrap().text, "first verdict");
}

#[tokio::test]
async fn test_missing_credential_still_presents_case() {
    let mut runner =
        SessionRunner::new(fatigue_case(), ResponseMode::Text).disable_grading("GEMINI_API_KEY is not set");
    let mut presenter = scripted("");

    let options = RunOptions {
        prefilled: Response::from_text("I asked about diet"),
        auto_submit: true,
        ..RunOptions::default()
    };
    let outcome = run_session(&mut runner, &mut presenter, options)
        .await
        .unwrap();

    assert!(matches!(
        outcome.error,
        Some(TrainerError::ConfigurationError { .. })
    ));
    let screen = String::from_utf8(presenter.into_output()).unwrap();
    assert!(screen.contains("Patient has fatigue"));
    assert!(screen.contains("Grading is unavailable: GEMINI_API_KEY is not set"));
}

#[tokio::test]
async fn test_empty_recording_aborts_before_inference() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(verdict_body("unused"));
    });
    let scratch = TempDir::new().unwrap();

    let transcriber = WhisperTranscriber::new(WhisperConfig {
        scratch_dir: Some(scratch.path().to_path_buf()),
        timeout: Duration::from_secs(5),
        ..WhisperConfig::default()
    });
    let mut runner = SessionRunner::new(fatigue_case(), ResponseMode::Transcribe)
        .with_provider(provider_for(&server))
        .with_transcriber(Arc::new(transcriber));

    runner.capture_response(Some(Response::Audio(AudioClip::wav(Vec::new()))));
    let err = runner.submit().await.unwrap_err();

    api_mock.assert_hits(0);
    assert!(matches!(err, TrainerError::TranscriptionError { .. }));
    assert_eq!(runner.state(), SessionState::Idle);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_sample_case_prompt_reaches_provider() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("Sarah Jenkins")
            .body_contains("Failure to ask about pregnancy.")
            .body_contains("## Critical Errors");
        then.status(200).json_body(verdict_body("## Verdict\nFAIL"));
    });

    let case = case_file::sample_case().unwrap();
    let mut runner =
        SessionRunner::new(Arc::new(case), ResponseMode::Text).with_provider(provider_for(&server));
    runner.capture_response(Response::from_text("It sounds like iron deficiency."));
    let verdict = runner.submit().await.unwrap();

    api_mock.assert();
    assert_eq!(verdict.text, "## Verdict\nFAIL");
}

#[tokio::test]
async fn test_unreadable_recording_falls_back_to_typed_answer() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("I asked about diet");
        then.status(200).json_body(verdict_body("## Verdict\nPASS"));
    });

    let mut runner =
        SessionRunner::new(fatigue_case(), ResponseMode::Audio).with_provider(provider_for(&server));
    // 錄音路徑不是 .wav -> 改為打字作答 -> 送出 -> 不顯示評分標準
    let mut presenter = scripted("answer.mp3\nI asked about diet\n\ny\nn\n");

    let options = RunOptions {
        interactive: true,
        ..RunOptions::default()
    };
    let outcome = run_session(&mut runner, &mut presenter, options)
        .await
        .unwrap();

    api_mock.assert();
    assert!(outcome.error.is_none());
    assert_eq!(outcome.verdict.unwrap().text, "## Verdict\nPASS");
    assert!(!outcome.rubric_revealed);

    let screen = String::from_utf8(presenter.into_output()).unwrap();
    assert!(screen.contains("❌ Setting 'audio' is invalid"));
    assert!(screen.contains("Type your answer instead."));
}

#[tokio::test]
async fn test_reference_dialogue_reveal_is_tracked() {
    let mut case = Case::new(
        "Patient has fatigue",
        vec!["Take history".to_string()],
        "Diagnosis: Anemia",
    );
    case.reference_dialogue = Some("Doctor: How long have you felt tired?".to_string());
    let mut runner = SessionRunner::new(Arc::new(case), ResponseMode::Text)
        .disable_grading("GEMINI_API_KEY is not set");
    // 看示範對話 -> 作答 -> 不送出 -> 不顯示評分標準
    let mut presenter = scripted("y\nI asked about diet\n\nn\nn\n");

    let options = RunOptions {
        interactive: true,
        ..RunOptions::default()
    };
    let outcome = run_session(&mut runner, &mut presenter, options)
        .await
        .unwrap();

    assert!(outcome.verdict.is_none() && outcome.error.is_none());
    assert!(runner.is_reference_dialogue_revealed());
    assert_eq!(runner.state(), SessionState::ResponseCaptured);

    let screen = String::from_utf8(presenter.into_output()).unwrap();
    assert!(screen.contains("--- Reference Dialogue ---\nDoctor: How long have you felt tired?"));
}
