use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tera::{Context as TeraContext, Tera};

use crate::languages::Language;

pub const TOOL_NAME: &str = "deliver_translation";

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("prompts/system_prompt.tera");

#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    pub source: Language,
    pub target: Language,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            source: Language::English,
            target: Language::Hindi,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub fn tool_spec(tool_name: &str) -> ToolSpec {
    ToolSpec {
        name: tool_name.to_string(),
        description: "Return the translation.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "translation": {"type": "string"},
                "target_language": {"type": "string"}
            },
            "required": ["translation", "target_language"]
        }),
    }
}

pub fn render_system_prompt(options: &TranslateOptions, tool_name: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("source_name", options.source.name());
    context.insert("source_code", options.source.code());
    context.insert("target_name", options.target.name());
    context.insert("target_code", options.target.code());
    context.insert("target_autonym", options.target.autonym());
    context.insert("tool_name", tool_name);

    Tera::one_off(SYSTEM_PROMPT_TEMPLATE, &context, false)
        .with_context(|| "failed to render system prompt")
}

/// Validates tool arguments and returns the translated text.
pub fn parse_tool_args(value: Value, options: &TranslateOptions) -> Result<String> {
    let args: ToolArgs =
        serde_json::from_value(value).with_context(|| "invalid translation tool arguments")?;
    if args.translation.trim().is_empty() {
        return Err(anyhow!("translation is empty"));
    }
    let reported = Language::parse(&args.target_language)
        .with_context(|| "tool response target_language is not a known language")?;
    if reported != options.target {
        return Err(anyhow!(
            "tool response target_language mismatch (expected '{}', got '{}')",
            options.target.code(),
            args.target_language.trim()
        ));
    }
    Ok(args.translation)
}

#[derive(Debug, Deserialize)]
struct ToolArgs {
    translation: String,
    target_language: String,
}
