use anyhow::{anyhow, Result};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

use crate::languages::Language;
use crate::settings::Settings;

mod huggingface;
mod local;
mod openai;

pub use huggingface::HuggingFace;
pub use local::Local;
pub use openai::OpenAI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    HuggingFace,
    Local,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Local => "local",
            ProviderKind::OpenAI => "openai",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub requested_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderResponse {
    pub translation: String,
    pub model: Option<String>,
    pub usage: Option<ProviderUsage>,
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<ProviderResponse>> + Send>>;

/// A translation backend. One call per request, no retries.
pub trait Provider: Clone + Send + Sync {
    fn translate(self, request: TranslationRequest) -> ProviderFuture;
}

#[derive(Debug, Clone)]
pub enum ProviderImpl {
    HuggingFace(HuggingFace),
    Local(Local),
    OpenAI(OpenAI),
}

impl Provider for ProviderImpl {
    fn translate(self, request: TranslationRequest) -> ProviderFuture {
        match self {
            ProviderImpl::HuggingFace(provider) => provider.translate(request),
            ProviderImpl::Local(provider) => provider.translate(request),
            ProviderImpl::OpenAI(provider) => provider.translate(request),
        }
    }
}

pub fn build_provider(
    selection: &ProviderSelection,
    key: Option<String>,
    settings: &Settings,
) -> Result<ProviderImpl> {
    match selection.provider {
        ProviderKind::HuggingFace => {
            let endpoint =
                get_env("HF_INFERENCE_URL").unwrap_or_else(|| settings.hf_endpoint.clone());
            let family = selection
                .requested_model
                .clone()
                .unwrap_or_else(|| settings.model_family.clone());
            Ok(ProviderImpl::HuggingFace(
                HuggingFace::new(endpoint)
                    .with_key(key)
                    .with_model_family(family),
            ))
        }
        ProviderKind::Local => {
            let family = selection
                .requested_model
                .clone()
                .unwrap_or_else(|| settings.model_family.clone());
            Ok(ProviderImpl::Local(
                Local::new(settings.model_dir.clone()).with_model_family(family),
            ))
        }
        ProviderKind::OpenAI => {
            let key = key.ok_or_else(|| anyhow!("OPENAI_API_KEY is required for openai"))?;
            let model = selection
                .requested_model
                .clone()
                .unwrap_or_else(|| settings.openai_model.clone());
            Ok(ProviderImpl::OpenAI(
                OpenAI::new(key)
                    .with_model(model)
                    .with_base_url(get_env("OPENAI_BASE_URL")),
            ))
        }
    }
}

/// `model_arg` is `provider` or `provider:model`; falls back to the configured backend.
pub fn resolve_provider_selection(
    model_arg: Option<&str>,
    settings: &Settings,
) -> Result<ProviderSelection> {
    match model_arg {
        Some(model) => parse_model_arg(model),
        None => parse_model_arg(&settings.backend),
    }
}

/// The Hugging Face token is optional, local models need none, OpenAI needs one.
pub fn resolve_key(provider: ProviderKind, override_key: Option<&str>) -> Result<Option<String>> {
    if let Some(key) = override_key.filter(|key| !key.trim().is_empty()) {
        return Ok(Some(key.trim().to_string()));
    }

    match provider {
        ProviderKind::HuggingFace => {
            Ok(get_env("HF_TOKEN").or_else(|| get_env("HUGGINGFACE_API_KEY")))
        }
        ProviderKind::Local => Ok(None),
        ProviderKind::OpenAI => get_env("OPENAI_API_KEY")
            .map(Some)
            .ok_or_else(|| anyhow!("API key not found for provider openai (set OPENAI_API_KEY)")),
    }
}

fn parse_model_arg(model_arg: &str) -> Result<ProviderSelection> {
    let raw = model_arg.trim();
    if raw.is_empty() {
        return Err(anyhow!("model argument is empty"));
    }

    if let Some(provider) = provider_from_name(&raw.to_lowercase()) {
        return Ok(ProviderSelection {
            provider,
            requested_model: None,
        });
    }

    if let Some((provider_part, model_part)) = raw.split_once(':') {
        if let Some(provider) = provider_from_name(&provider_part.trim().to_lowercase()) {
            let model = model_part.trim();
            return Ok(ProviderSelection {
                provider,
                requested_model: (!model.is_empty()).then(|| model.to_string()),
            });
        }
    }

    Err(anyhow!(
        "unable to infer provider from '{}'. Use provider or provider:model (huggingface:, local:, openai:)",
        raw
    ))
}

fn provider_from_name(name: &str) -> Option<ProviderKind> {
    match name {
        "huggingface" | "hf" => Some(ProviderKind::HuggingFace),
        "local" | "marian" => Some(ProviderKind::Local),
        "openai" => Some(ProviderKind::OpenAI),
        _ => None,
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
