use crate::domain::model::AudioClip;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部推論服務：一次請求，回傳未結構化文字
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn model_id(&self) -> &str;

    async fn evaluate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<String>;
}

/// 本機語音轉文字
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String>;
}

/// 呈現層：任何能提供這些基本操作的 UI 都可以
pub trait Presenter {
    fn render_heading(&mut self, text: &str) -> Result<()>;
    fn render_text(&mut self, text: &str) -> Result<()>;
    fn render_list(&mut self, items: &[String]) -> Result<()>;
    fn capture_text(&mut self, label: &str) -> Result<Option<String>>;
    fn capture_audio(&mut self, label: &str) -> Result<Option<Vec<u8>>>;
    /// 使用者是否觸發某個動作 (例如 "Submit for Assessment")
    fn on_action(&mut self, label: &str) -> Result<bool>;
    fn reveal(&mut self, label: &str, content: &str) -> Result<()>;
}
