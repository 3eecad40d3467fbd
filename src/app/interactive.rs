//! The single practice interaction: present the case, capture an answer,
//! grade it and optionally reveal the rubric.
//!
//! Grading failures are shown through the presenter and handed back in
//! [`SessionOutcome`]; only presentation I/O errors abort the run.

use crate::core::prompt::task_label;
use crate::core::session::{ResponseMode, SessionRunner};
use crate::domain::model::{AudioClip, Response, Verdict};
use crate::domain::ports::Presenter;
use crate::utils::error::{Result, TrainerError};

pub const SUBMIT_ACTION: &str = "Submit for Assessment";
pub const REVEAL_ACTION: &str = "Reveal Official Rubric & Answer";
pub const DIALOGUE_ACTION: &str = "View Sample Doctor/Patient Interaction";

#[derive(Debug, Default)]
pub struct RunOptions {
    /// 命令列預先提供的答案
    pub prefilled: Option<Response>,
    pub auto_submit: bool,
    pub reveal: bool,
    /// false 時不向使用者詢問任何動作
    pub interactive: bool,
}

#[derive(Debug, Default)]
pub struct SessionOutcome {
    pub verdict: Option<Verdict>,
    pub error: Option<TrainerError>,
    pub rubric_revealed: bool,
}

/// 把每個任務的答案合成一個文字作答；全部空白則視為未作答
pub fn combine_task_answers(tasks: &[String], answers: &[Option<String>]) -> Option<Response> {
    let sections: Vec<String> = tasks
        .iter()
        .zip(answers)
        .enumerate()
        .filter_map(|(index, (task, answer))| {
            let answer = answer.as_deref()?.trim();
            if answer.is_empty() {
                return None;
            }
            Some(format!(
                "Task {} ({}):\n{}",
                task_label(index),
                task,
                answer
            ))
        })
        .collect();

    Response::from_text(sections.join("\n\n"))
}

fn capture_typed(runner: &SessionRunner, presenter: &mut dyn Presenter) -> Result<Option<Response>> {
    let tasks = runner.case().tasks.clone();
    let mut answers = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        answers.push(presenter.capture_text(&format!("Task {}: {}", task_label(index), task))?);
    }
    Ok(combine_task_answers(&tasks, &answers))
}

fn capture_interactively(
    runner: &SessionRunner,
    presenter: &mut dyn Presenter,
) -> Result<Option<Response>> {
    presenter.render_heading("Perform Your Tasks")?;

    if runner.mode().accepts_audio() {
        match presenter.capture_audio("Record your answer to all tasks") {
            Ok(Some(bytes)) => return Ok(Some(Response::Audio(AudioClip::wav(bytes)))),
            Ok(None) => {
                presenter.render_text("No recording given; type your answer instead.")?;
            }
            Err(e) => {
                tracing::warn!("⚠️ Recording could not be read: {}", e);
                presenter.render_text(&format!("❌ {}", e.user_friendly_message()))?;
                presenter.render_text("Type your answer instead.")?;
            }
        }
    }

    capture_typed(runner, presenter)
}

pub async fn run_session(
    runner: &mut SessionRunner,
    presenter: &mut dyn Presenter,
    options: RunOptions,
) -> Result<SessionOutcome> {
    let mut outcome = SessionOutcome::default();

    runner.present_case(presenter)?;
    if let Some(reason) = runner.grading_unavailable_reason() {
        presenter.render_text(&format!("⚠️ Grading is unavailable: {}", reason))?;
    }

    if options.interactive {
        if let Some(dialogue) = runner.reference_dialogue().map(str::to_string) {
            if presenter.on_action(DIALOGUE_ACTION)? {
                if !runner.is_reference_dialogue_revealed() {
                    runner.toggle_reference_dialogue();
                }
                presenter.reveal("Reference Dialogue", &dialogue)?;
            }
        }
    }

    let response = match options.prefilled {
        Some(response) => Some(response),
        None if options.interactive => capture_interactively(runner, presenter)?,
        None => None,
    };
    if let Some(captured) = runner.capture_response(response) {
        tracing::debug!("Captured {} response", captured.kind());
    }

    let submit = options.auto_submit || (options.interactive && presenter.on_action(SUBMIT_ACTION)?);
    if submit {
        if runner.mode() == ResponseMode::Transcribe {
            presenter.render_text("Transcribing your recording...")?;
        }
        presenter.render_text("Analyzing your response against AMC rubrics...")?;
        match runner.submit().await {
            Ok(verdict) => {
                presenter.render_heading(&format!("Assessment ({})", verdict.model))?;
                presenter.render_text(&verdict.text)?;
                outcome.verdict = Some(verdict.clone());
            }
            Err(e) => {
                presenter.render_text(&format!("❌ {}", e.user_friendly_message()))?;
                outcome.error = Some(e);
            }
        }
    }

    let reveal = options.reveal || (options.interactive && presenter.on_action(REVEAL_ACTION)?);
    if reveal {
        if !runner.is_rubric_revealed() {
            runner.toggle_rubric();
        }
        presenter.render_text("Only open this AFTER you have attempted the case!")?;
        presenter.reveal("Official Rubric & Answer", &runner.reveal_rubric())?;
        outcome.rubric_revealed = true;
    }

    Ok(outcome)
}
