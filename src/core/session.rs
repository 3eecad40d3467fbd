use crate::core::prompt::{build_prompt, PromptInput};
use crate::domain::model::{AudioClip, Case, Response, Verdict};
use crate::domain::ports::{InferenceProvider, Presenter, Transcriber};
use crate::utils::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 作答方式：打字、錄音直送模型、或先在本機轉錄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Text,
    Audio,
    Transcribe,
}

impl ResponseMode {
    pub fn accepts_audio(&self) -> bool {
        !matches!(self, ResponseMode::Text)
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseMode::Text => "text",
            ResponseMode::Audio => "audio",
            ResponseMode::Transcribe => "transcribe",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ResponseCaptured,
    Grading,
    VerdictShown,
}

/// 一個使用者的一次練習；病例唯讀共用，其餘狀態各自獨立
pub struct SessionRunner {
    case: Arc<Case>,
    mode: ResponseMode,
    provider: Option<Arc<dyn InferenceProvider>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    grading_disabled: Option<String>,
    state: SessionState,
    response: Option<Response>,
    verdict: Option<Verdict>,
    last_prompt: Option<String>,
    rubric_revealed: bool,
    dialogue_revealed: bool,
}

impl SessionRunner {
    pub fn new(case: Arc<Case>, mode: ResponseMode) -> Self {
        Self {
            case,
            mode,
            provider: None,
            transcriber: None,
            grading_disabled: None,
            state: SessionState::Idle,
            response: None,
            verdict: None,
            last_prompt: None,
            rubric_revealed: false,
            dialogue_revealed: false,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// 啟動時設定錯誤：病例照常顯示，只停用評分
    pub fn disable_grading(mut self, reason: impl Into<String>) -> Self {
        self.grading_disabled = Some(reason.into());
        self
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub fn grading_unavailable_reason(&self) -> Option<&str> {
        match (&self.grading_disabled, &self.provider) {
            (Some(reason), _) => Some(reason.as_str()),
            (None, None) => Some("no inference provider is configured"),
            (None, Some(_)) => None,
        }
    }

    pub fn present_case(&self, presenter: &mut dyn Presenter) -> Result<()> {
        let case = &self.case;
        presenter.render_heading(case.title.as_deref().unwrap_or("Scenario & Tasks"))?;
        let headline = case.headline();
        if !headline.is_empty() {
            presenter.render_list(&headline)?;
        }
        presenter.render_text(&case.scenario)?;
        presenter.render_heading("Tasks")?;
        let tasks: Vec<String> = case
            .tasks
            .iter()
            .enumerate()
            .map(|(index, task)| format!("{}. {}", crate::core::prompt::task_label(index), task))
            .collect();
        presenter.render_list(&tasks)
    }

    pub fn capture_response(&mut self, response: Option<Response>) -> Option<&Response> {
        self.response = response;
        self.transition(if self.response.is_some() {
            SessionState::ResponseCaptured
        } else {
            SessionState::Idle
        });
        self.response.as_ref()
    }

    pub async fn transcribe(&self, audio: &AudioClip) -> Result<String> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            TrainerError::config("local transcription is not configured for this session")
        })?;

        let transcript = transcriber.transcribe(audio).await?;
        if transcript.trim().is_empty() {
            return Err(TrainerError::transcription(
                "no speech was recognised in the recording",
            ));
        }
        Ok(transcript)
    }

    pub fn build_prompt(&self, input: PromptInput<'_>) -> String {
        build_prompt(&self.case, input)
    }

    pub async fn evaluate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<Verdict> {
        let provider = self.ready_provider()?;
        tracing::info!(
            "📨 Sending grading request to {} (audio attached: {})",
            provider.model_id(),
            audio.is_some()
        );
        let text = provider.evaluate(prompt, audio).await?;
        Ok(Verdict::new(text, provider.model_id()))
    }

    /// 評分動作：沒有作答直接回 EmptyInputError，不會發出任何請求。
    /// 任何錯誤都回到 Idle，之前的評語保持不變。
    pub async fn submit(&mut self) -> Result<&Verdict> {
        let Some(response) = self.response.clone() else {
            self.transition(SessionState::Idle);
            return Err(TrainerError::empty_input(
                "submit was pressed before any response was captured",
            ));
        };

        self.transition(SessionState::Grading);
        match self.grade(&response).await {
            Ok(verdict) => {
                self.transition(SessionState::VerdictShown);
                Ok(self.verdict.insert(verdict))
            }
            Err(e) => {
                tracing::warn!("⚠️ Grading attempt aborted: {}", e);
                self.response = None;
                self.transition(SessionState::Idle);
                Err(e)
            }
        }
    }

    async fn grade(&mut self, response: &Response) -> Result<Verdict> {
        self.ready_provider()?;

        match (self.mode, response) {
            (_, Response::Text(content)) => {
                let prompt = self.build_prompt(PromptInput::Text(content));
                self.last_prompt = Some(prompt.clone());
                self.evaluate(&prompt, None).await
            }
            (ResponseMode::Audio, Response::Audio(clip)) if clip.is_empty() => Err(
                TrainerError::empty_input("the recording is empty"),
            ),
            (ResponseMode::Audio, Response::Audio(clip)) => {
                let prompt = self.build_prompt(PromptInput::AttachedAudio);
                self.last_prompt = Some(prompt.clone());
                self.evaluate(&prompt, Some(clip)).await
            }
            (ResponseMode::Transcribe, Response::Audio(clip)) => {
                let transcript = self.transcribe(clip).await?;
                tracing::debug!("📝 Transcript ready ({} chars)", transcript.len());
                let prompt = self.build_prompt(PromptInput::Text(&transcript));
                self.last_prompt = Some(prompt.clone());
                self.evaluate(&prompt, None).await
            }
            (ResponseMode::Text, Response::Audio(_)) => Err(TrainerError::config(
                "audio responses need --mode audio or --mode transcribe",
            )),
        }
    }

    fn ready_provider(&self) -> Result<&Arc<dyn InferenceProvider>> {
        if let Some(reason) = &self.grading_disabled {
            return Err(TrainerError::config(reason.clone()));
        }
        self.provider
            .as_ref()
            .ok_or_else(|| TrainerError::config("no inference provider is configured"))
    }

    pub fn reveal_rubric(&self) -> String {
        self.case.full_rubric()
    }

    pub fn toggle_rubric(&mut self) -> bool {
        self.rubric_revealed = !self.rubric_revealed;
        self.rubric_revealed
    }

    pub fn is_rubric_revealed(&self) -> bool {
        self.rubric_revealed
    }

    pub fn reference_dialogue(&self) -> Option<&str> {
        self.case.reference_dialogue.as_deref()
    }

    pub fn toggle_reference_dialogue(&mut self) -> bool {
        self.dialogue_revealed = !self.dialogue_revealed;
        self.dialogue_revealed
    }

    pub fn is_reference_dialogue_revealed(&self) -> bool {
        self.dialogue_revealed
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!("session state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
