use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Provider, ProviderFuture, ProviderResponse, TranslationRequest};
use crate::languages::{model_id, DEFAULT_MODEL_FAMILY};
use crate::settings::DEFAULT_HF_ENDPOINT;

/// Hosted inference for the pretrained opus-mt models, one model per language pair.
#[derive(Debug, Clone)]
pub struct HuggingFace {
    key: Option<String>,
    endpoint: String,
    model_family: String,
}

impl HuggingFace {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_HF_ENDPOINT.to_string()
        } else {
            endpoint.trim().trim_end_matches('/').to_string()
        };
        Self {
            key: None,
            endpoint,
            model_family: DEFAULT_MODEL_FAMILY.to_string(),
        }
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    pub fn with_model_family(mut self, family: impl Into<String>) -> Self {
        let family = family.into();
        if !family.trim().is_empty() {
            self.model_family = family.trim().to_string();
        }
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint, model)
    }
}

impl Provider for HuggingFace {
    fn translate(self, request: TranslationRequest) -> ProviderFuture {
        Box::pin(async move {
            let model = model_id(&self.model_family, request.source, request.target);
            let url = self.model_url(&model);
            debug!("huggingface: POST {}", url);

            let body = json!({
                "inputs": request.text,
                "options": {"wait_for_model": true}
            });
            let client = reqwest::Client::new();
            let mut builder = client.post(&url).json(&body);
            if let Some(key) = self.key.as_deref() {
                builder = builder.bearer_auth(key);
            }
            let response = builder
                .send()
                .await
                .with_context(|| format!("failed to call inference endpoint for {}", model))?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(anyhow!(
                    "Hugging Face API error ({}) for {}: {}",
                    status,
                    model,
                    extract_hf_error(&text).unwrap_or(text)
                ));
            }
            extract_translation(&text, &model)
        })
    }
}

fn extract_translation(text: &str, model: &str) -> Result<ProviderResponse> {
    if let Some(error) = extract_hf_error(text) {
        return Err(anyhow!("Hugging Face API error for {}: {}", model, error));
    }
    let outputs: Vec<TranslationOutput> =
        serde_json::from_str(text).with_context(|| "failed to parse Hugging Face response JSON")?;
    let translation = outputs
        .into_iter()
        .next()
        .map(|output| output.translation_text)
        .ok_or_else(|| anyhow!("no translation returned from {}", model))?;
    Ok(ProviderResponse {
        translation,
        model: Some(model.to_string()),
        usage: None,
    })
}

fn extract_hf_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: serde_json::Value,
        estimated_time: Option<f64>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.error {
        serde_json::Value::String(message) => message,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };
    match parsed.estimated_time {
        Some(secs) => Some(format!("{} (estimated time {:.0}s)", message, secs)),
        None => Some(message),
    }
}

#[derive(Debug, Deserialize)]
struct TranslationOutput {
    #[serde(alias = "generated_text")]
    translation_text: String,
}
