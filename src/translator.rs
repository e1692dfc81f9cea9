use anyhow::{anyhow, Result};
use tracing::info;

use crate::languages;
use crate::providers::{Provider, ProviderUsage, TranslationRequest};
use crate::translations::TranslateOptions;

/// Shown when there is nothing to translate.
pub const EMPTY_INPUT_WARNING: &str = "Please enter some text for translation.";

#[derive(Debug, Clone)]
pub struct Translator<P: Provider + Clone> {
    provider: P,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<ProviderUsage>,
}

impl<P: Provider + Clone> Translator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn exec(&self, input: &str, options: TranslateOptions) -> Result<ExecutionOutput> {
        let text = input.trim();
        if text.is_empty() {
            return Err(anyhow!(EMPTY_INPUT_WARNING));
        }
        languages::validate_pair(options.source, options.target)?;

        info!(
            "translating {} chars {} -> {}",
            text.chars().count(),
            options.source.code(),
            options.target.code()
        );
        let response = self
            .provider
            .clone()
            .translate(TranslationRequest {
                text: text.to_string(),
                source: options.source,
                target: options.target,
            })
            .await?;

        let translated = response.translation.trim();
        if translated.is_empty() {
            return Err(anyhow!("translation returned empty text"));
        }
        Ok(ExecutionOutput {
            text: translated.to_string(),
            model: response.model,
            usage: response.usage,
        })
    }
}

pub fn format_execution_output(
    execution: &ExecutionOutput,
    with_using_model: bool,
    with_using_tokens: bool,
) -> String {
    let mut output = execution.text.clone();
    let mut meta_lines = Vec::new();

    if with_using_model {
        let model = execution.model.as_deref().unwrap_or("unavailable");
        meta_lines.push(format!("model: {}", model));
    }

    if with_using_tokens {
        meta_lines.push(format_usage(execution.usage.as_ref()));
    }

    if !meta_lines.is_empty() {
        output.push('\n');
        output.push_str(&meta_lines.join("\n"));
    }

    output
}

fn format_usage(usage: Option<&ProviderUsage>) -> String {
    let Some(usage) = usage else {
        return "tokens: unavailable".to_string();
    };
    let total = usage.total_tokens.or_else(|| {
        usage
            .prompt_tokens
            .zip(usage.completion_tokens)
            .map(|(prompt, completion)| prompt + completion)
    });

    let mut parts = Vec::new();
    if let Some(prompt) = usage.prompt_tokens {
        parts.push(format!("prompt={}", prompt));
    }
    if let Some(completion) = usage.completion_tokens {
        parts.push(format!("completion={}", completion));
    }
    if let Some(total) = total {
        parts.push(format!("total={}", total));
    }

    if parts.is_empty() {
        "tokens: unavailable".to_string()
    } else {
        format!("tokens: {}", parts.join(", "))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::languages::Language;
    use crate::providers::{ProviderFuture, ProviderResponse};
    use std::sync::{Arc, Mutex};

    /// Echoes a canned translation and records what it was asked.
    #[derive(Clone, Default)]
    pub(crate) struct TestProvider {
        pub(crate) translation: String,
        pub(crate) seen: Arc<Mutex<Vec<TranslationRequest>>>,
    }

    impl TestProvider {
        pub(crate) fn returning(translation: &str) -> Self {
            Self {
                translation: translation.to_string(),
                seen: Arc::default(),
            }
        }
    }

    impl Provider for TestProvider {
        fn translate(self, request: TranslationRequest) -> ProviderFuture {
            self.seen.lock().expect("seen lock").push(request.clone());
            let translation = self.translation;
            Box::pin(async move {
                Ok(ProviderResponse {
                    translation,
                    model: Some(languages::model_id(
                        languages::DEFAULT_MODEL_FAMILY,
                        request.source,
                        request.target,
                    )),
                    usage: None,
                })
            })
        }
    }

    fn to(target: Language) -> TranslateOptions {
        TranslateOptions {
            source: Language::English,
            target,
        }
    }

    #[tokio::test]
    async fn exec_trims_input_and_reports_model() {
        let provider = TestProvider::returning(" হ্যালো \n");
        let translator = Translator::new(provider.clone());
        let output = translator
            .exec("  hello  ", to(Language::Bengali))
            .await
            .unwrap();
        assert_eq!(output.text, "হ্যালো");
        assert_eq!(output.model.as_deref(), Some("Helsinki-NLP/opus-mt-en-bn"));
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].text, "hello");
        assert_eq!(seen[0].target, Language::Bengali);
    }

    #[tokio::test]
    async fn empty_input_warns_without_calling_provider() {
        let provider = TestProvider::returning("unused");
        let translator = Translator::new(provider.clone());
        let err = translator.exec(" \n\t", to(Language::Hindi)).await.unwrap_err();
        assert_eq!(err.to_string(), EMPTY_INPUT_WARNING);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_target_is_rejected() {
        let translator = Translator::new(TestProvider::returning("x"));
        assert!(translator.exec("hi", to(Language::English)).await.is_err());
    }

    #[tokio::test]
    async fn blank_translation_is_an_error() {
        let translator = Translator::new(TestProvider::returning("   "));
        let err = translator.exec("hi", to(Language::Tamil)).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn output_metadata_lines() {
        let execution = ExecutionOutput {
            text: "नमस्ते".to_string(),
            model: Some("Helsinki-NLP/opus-mt-en-hi".to_string()),
            usage: Some(ProviderUsage {
                prompt_tokens: Some(10),
                completion_tokens: Some(4),
                total_tokens: None,
            }),
        };
        assert_eq!(format_execution_output(&execution, false, false), "नमस्ते");
        assert_eq!(
            format_execution_output(&execution, true, true),
            "नमस्ते\nmodel: Helsinki-NLP/opus-mt-en-hi\ntokens: prompt=10, completion=4, total=14"
        );
        let bare = ExecutionOutput {
            usage: None,
            model: None,
            ..execution
        };
        assert_eq!(
            format_execution_output(&bare, true, true),
            "नमस्ते\nmodel: unavailable\ntokens: unavailable"
        );
    }
}
