use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use crate::languages::{Language, SOURCE_LANGUAGES, TARGET_LANGUAGES};
use crate::settings::Settings;
use crate::translator::EMPTY_INPUT_WARNING;

use super::models::LanguageOption;

const PAGE_TEMPLATE: &str = include_str!("templates/index.html.tera");
pub(crate) const PAGE_TITLE: &str = "Indian Language Translator with Speech Output";

pub(crate) fn render_page(settings: &Settings) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("title", PAGE_TITLE);
    context.insert("source_languages", &language_options(SOURCE_LANGUAGES));
    context.insert("target_languages", &language_options(TARGET_LANGUAGES));
    context.insert("empty_warning", EMPTY_INPUT_WARNING);
    context.insert("max_upload_bytes", &settings.max_upload_bytes);
    Tera::one_off(PAGE_TEMPLATE, &context, true).with_context(|| "failed to render page template")
}

pub(crate) fn language_options(languages: &[Language]) -> Vec<LanguageOption> {
    languages
        .iter()
        .map(|language| LanguageOption {
            value: language.name().to_string(),
            label: language.name().to_string(),
            autonym: language.autonym().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_fixed_options() {
        let page = render_page(&Settings::default()).unwrap();
        assert!(page.contains(PAGE_TITLE));
        assert!(page.contains(r#"<option value="English">English</option>"#));
        for language in TARGET_LANGUAGES {
            assert!(page.contains(&format!(r#"<option value="{0}">{0}"#, language.name())));
        }
        assert!(page.contains("Extract and Translate Text"));
        assert!(page.contains("Speak Translation"));
        assert!(page.contains(r#"accept=".png,.jpg,.jpeg,image/png,image/jpeg""#));
    }

    #[test]
    fn warnings_are_embedded_as_json() {
        let page = render_page(&Settings::default()).unwrap();
        assert!(page.contains(r#"const EMPTY_WARNING = "Please enter some text for translation.";"#));
        assert!(page.contains("const MAX_UPLOAD_BYTES = 10485760;"));
    }
}
