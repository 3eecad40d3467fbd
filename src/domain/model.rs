use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 病例：情境、任務清單與評分標準，由內容作者提供
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub setting: Option<String>,
    #[serde(default)]
    pub patient: Option<String>,
    #[serde(default)]
    pub complaint: Option<String>,
    pub scenario: String,
    pub tasks: Vec<String>,
    pub rubric: String,
    #[serde(default)]
    pub critical_errors: Vec<String>,
    #[serde(default)]
    pub reference_dialogue: Option<String>,
}

impl Case {
    pub fn new(scenario: impl Into<String>, tasks: Vec<String>, rubric: impl Into<String>) -> Self {
        Self {
            title: None,
            setting: None,
            patient: None,
            complaint: None,
            scenario: scenario.into(),
            tasks,
            rubric: rubric.into(),
            critical_errors: Vec::new(),
            reference_dialogue: None,
        }
    }

    /// 標題欄位 (Setting / Patient / Complaint)，沒有則為空
    pub fn headline(&self) -> Vec<String> {
        [
            ("Setting", &self.setting),
            ("Patient", &self.patient),
            ("Complaint", &self.complaint),
        ]
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect()
    }

    /// 評分標準全文，含關鍵錯誤清單
    pub fn full_rubric(&self) -> String {
        if self.critical_errors.is_empty() {
            return self.rubric.clone();
        }

        let mut text = self.rubric.clone();
        text.push_str("\n\nCritical Errors:\n");
        for error in &self.critical_errors {
            text.push_str(&format!("* {}\n", error));
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    Wav,
}

impl AudioEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::Wav => "audio/wav",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub encoding: AudioEncoding,
}

impl AudioClip {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            encoding: AudioEncoding::Wav,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 一次作答只有一個 Response，程式結束即丟棄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Text(String),
    Audio(AudioClip),
}

impl Response {
    /// 空白文字或零長度錄音視為未作答
    pub fn from_text(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Response::Text(content))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Response::Text(_) => "text",
            Response::Audio(_) => "audio",
        }
    }
}

/// 模型回傳的評語，原樣顯示不解析
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub text: String,
    pub model: String,
    pub received_at: DateTime<Utc>,
}

impl Verdict {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            received_at: Utc::now(),
        }
    }
}
