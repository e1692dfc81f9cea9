use anyhow::{Context, Result};
use std::path::Path;

pub mod languages;
pub mod logging;
pub mod ocr;
mod providers;
pub mod server;
pub mod settings;
pub mod speech;
pub mod translations;
mod translator;

#[cfg(test)]
mod test_util;

pub use languages::Language;
pub use providers::{
    HuggingFace, Local, OpenAI, Provider, ProviderFuture, ProviderImpl, ProviderKind, ProviderResponse,
    ProviderUsage, TranslationRequest,
};
pub use translations::TranslateOptions;
pub use translator::{format_execution_output, ExecutionOutput, Translator, EMPTY_INPUT_WARNING};

#[derive(Debug, Clone)]
pub struct Config {
    pub lang: String,
    pub source_lang: String,
    pub model: Option<String>,
    pub key: Option<String>,
    pub image: Option<String>,
    pub speak: bool,
    pub speak_out: Option<String>,
    pub settings_path: Option<String>,
    pub show_enabled_languages: bool,
    pub show_ocr_languages: bool,
    pub with_using_tokens: bool,
    pub with_using_model: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang: Language::Hindi.name().to_string(),
            source_lang: Language::English.name().to_string(),
            model: None,
            key: None,
            image: None,
            speak: false,
            speak_out: None,
            settings_path: None,
            show_enabled_languages: false,
            show_ocr_languages: false,
            with_using_tokens: false,
            with_using_model: false,
        }
    }
}

pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings = load_settings(&config)?;

    if config.show_enabled_languages {
        return Ok(format_enabled_languages());
    }
    if config.show_ocr_languages {
        return Ok(ocr::list_tesseract_languages(&settings.ocr_command)?.join("\n"));
    }

    let translator = build_translator(&config, &settings)?;
    run_with(&translator, &config, &settings, input).await
}

async fn run_with<P: Provider>(
    translator: &Translator<P>,
    config: &Config,
    settings: &settings::Settings,
    input: Option<String>,
) -> Result<String> {
    let options = resolve_options(config)?;

    let (extracted, input) = match config.image.as_deref() {
        Some(path) => {
            let text = extract_image_text(Path::new(path), settings)?;
            (Some(text.clone()), text)
        }
        None => (None, input.unwrap_or_default()),
    };

    let execution = translator.exec(&input, options).await?;

    if let Some(path) = config.speak_out.as_deref() {
        let audio = speech::synthesize(&execution.text, options.target, settings)?;
        speech::write_wav(&audio, Path::new(path))?;
    }
    if config.speak {
        speech::speak(&execution.text, options.target, settings)?;
    }

    let output = format_execution_output(
        &execution,
        config.with_using_model,
        config.with_using_tokens,
    );
    Ok(match extracted {
        Some(extracted) => format!(
            "Extracted Text: {}\nTranslated Text in {}: {}",
            extracted, options.target, output
        ),
        None => output,
    })
}

/// Starts the web form on `addr` (or the configured address).
pub async fn serve(config: Config, addr: Option<String>) -> Result<()> {
    let settings = load_settings(&config)?;
    let translator = build_translator(&config, &settings)?;
    let addr = addr.unwrap_or_else(|| settings.server_addr.clone());
    let state = server::ServerState::new(settings, translator)?;
    server::run_server(state, &addr).await
}

pub fn resolve_options(config: &Config) -> Result<TranslateOptions> {
    let source = Language::parse(&config.source_lang)
        .with_context(|| "invalid source language")?;
    let target = Language::parse(&config.lang).with_context(|| "invalid target language")?;
    languages::validate_pair(source, target)?;
    Ok(TranslateOptions { source, target })
}

fn load_settings(config: &Config) -> Result<settings::Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    settings::load_settings(settings_path)
}

fn build_translator(
    config: &Config,
    settings: &settings::Settings,
) -> Result<Translator<ProviderImpl>> {
    let selection = providers::resolve_provider_selection(config.model.as_deref(), settings)?;
    let key = providers::resolve_key(selection.provider, config.key.as_deref())
        .with_context(|| "no API key found for selected provider")?;
    let provider = providers::build_provider(&selection, key, settings)?;
    Ok(Translator::new(provider))
}

/// Empty OCR output is passed on so the translator reports the usual empty-input warning.
fn extract_image_text(path: &Path, settings: &settings::Settings) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image: {}", path.display()))?;
    let extracted = ocr::extract_text(&bytes, &ocr::OcrOptions::from_settings(settings))
        .with_context(|| format!("failed to extract text from {}", path.display()))?;
    Ok(extracted.text)
}

fn format_enabled_languages() -> String {
    let mut lines = Vec::new();
    for language in languages::SOURCE_LANGUAGES {
        lines.push(format!(
            "source\t{}\t{}\t{}",
            language.code(),
            language.name(),
            language.autonym()
        ));
    }
    for language in languages::TARGET_LANGUAGES {
        lines.push(format!(
            "target\t{}\t{}\t{}",
            language.code(),
            language.name(),
            language.autonym()
        ));
    }
    lines.join("\n")
}
