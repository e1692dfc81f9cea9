use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TranslateResponse {
    pub original: String,
    pub translated: String,
    pub target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExtractRequest {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image_base64: String,
    pub source_lang: Option<String>,
    pub target_lang: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExtractResponse {
    pub extracted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
    pub target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SpeakRequest {
    pub text: String,
    pub lang: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SpeakResponse {
    pub mime: String,
    pub audio_base64: String,
    pub sample_rate: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LanguageOption {
    pub value: String,
    pub label: String,
    pub autonym: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LanguagesResponse {
    pub source: Vec<LanguageOption>,
    pub target: Vec<LanguageOption>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
