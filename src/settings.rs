use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::languages::DEFAULT_MODEL_FAMILY;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const DEFAULT_HF_ENDPOINT: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_OCR_COMMAND: &str = "tesseract";

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: String,
    pub model_family: String,
    pub hf_endpoint: String,
    pub openai_model: String,
    /// Root of `<model id>/` folders for the local backend; the hub cache when unset.
    pub model_dir: Option<PathBuf>,
    pub ocr_command: String,
    pub ocr_languages: String,
    pub ocr_psm: u32,
    pub ocr_preprocess: bool,
    pub speech_engine: Option<String>,
    pub speech_rate: u32,
    pub speech_voices: HashMap<String, String>,
    pub server_addr: String,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "huggingface".to_string(),
            model_family: DEFAULT_MODEL_FAMILY.to_string(),
            hf_endpoint: DEFAULT_HF_ENDPOINT.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            model_dir: None,
            ocr_command: DEFAULT_OCR_COMMAND.to_string(),
            ocr_languages: "eng".to_string(),
            ocr_psm: 3,
            ocr_preprocess: true,
            speech_engine: None,
            speech_rate: 150,
            speech_voices: HashMap::new(),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    translation: Option<TranslationSettings>,
    ocr: Option<OcrSettings>,
    speech: Option<SpeechSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    backend: Option<String>,
    model_family: Option<String>,
    endpoint: Option<String>,
    openai_model: Option<String>,
    model_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    command: Option<String>,
    languages: Option<String>,
    psm: Option<u32>,
    preprocess: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechSettings {
    engine: Option<String>,
    rate: Option<u32>,
    voices: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    max_upload_bytes: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    load_settings_from(&ordered_paths)
}

/// Merges every existing file in `paths`, later files winning.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_str(&content).with_context(|| {
                format!("failed to parse settings: {}", path.display())
            })?;
        }
    }
    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(translation) = incoming.translation {
            merge_string(&mut self.backend, translation.backend);
            merge_string(&mut self.model_family, translation.model_family);
            merge_string(&mut self.hf_endpoint, translation.endpoint);
            merge_string(&mut self.openai_model, translation.openai_model);
            if let Some(dir) = translation.model_dir {
                if !dir.trim().is_empty() {
                    self.model_dir = Some(PathBuf::from(dir.trim()));
                }
            }
        }
        if let Some(ocr) = incoming.ocr {
            merge_string(&mut self.ocr_command, ocr.command);
            merge_string(&mut self.ocr_languages, ocr.languages);
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
            if let Some(preprocess) = ocr.preprocess {
                self.ocr_preprocess = preprocess;
            }
        }
        if let Some(speech) = incoming.speech {
            if let Some(engine) = speech.engine {
                if !engine.trim().is_empty() {
                    self.speech_engine = Some(engine.trim().to_string());
                }
            }
            if let Some(rate) = speech.rate {
                if rate > 0 {
                    self.speech_rate = rate;
                }
            }
            if let Some(voices) = speech.voices {
                for (code, voice) in voices {
                    if !voice.trim().is_empty() {
                        self.speech_voices
                            .insert(code.trim().to_lowercase(), voice.trim().to_string());
                    }
                }
            }
        }
        if let Some(server) = incoming.server {
            merge_string(&mut self.server_addr, server.addr);
            if let Some(limit) = server.max_upload_bytes {
                if limit > 0 {
                    self.max_upload_bytes = limit;
                }
            }
        }
    }
}

fn merge_string(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            *slot = value.to_string();
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".indic-translator"))
        }
    })
}
