mod engine;

use anyhow::{anyhow, Result};

use crate::settings::{Settings, DEFAULT_OCR_COMMAND};

pub use engine::{decode_image, extract_text, list_tesseract_languages, recognize};

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract executable, a name on `PATH` or a path.
    pub command: String,
    /// Tesseract `-l` value, e.g. `eng` or `eng+hin`.
    pub languages: String,
    pub psm: u32,
    pub preprocess: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            command: DEFAULT_OCR_COMMAND.to_string(),
            languages: "eng".to_string(),
            psm: 3,
            preprocess: true,
        }
    }
}

impl OcrOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            command: settings.ocr_command.clone(),
            languages: settings.ocr_languages.clone(),
            psm: settings.ocr_psm,
            preprocess: settings.ocr_preprocess,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrText {
    pub text: String,
    pub width: u32,
    pub height: u32,
}

impl OcrText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Sniffs the upload and accepts only PNG and JPEG.
pub fn detect_image_mime(bytes: &[u8]) -> Result<&'static str> {
    if bytes.is_empty() {
        return Err(anyhow!("image is empty"));
    }
    match infer::get(bytes).map(|kind| kind.mime_type()) {
        Some(PNG_MIME) => Ok(PNG_MIME),
        Some(JPEG_MIME) => Ok(JPEG_MIME),
        Some(other) => Err(anyhow!(
            "unsupported image type '{}' (expected png, jpg or jpeg)",
            other
        )),
        None => Err(anyhow!(
            "unrecognized image data (expected png, jpg or jpeg)"
        )),
    }
}
