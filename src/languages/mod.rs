use anyhow::{anyhow, Result};

pub const DEFAULT_MODEL_FAMILY: &str = "Helsinki-NLP/opus-mt";

/// Languages the translator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
    Marathi,
    Bengali,
    Gujarati,
    Tamil,
    Telugu,
}

pub const SOURCE_LANGUAGES: &[Language] = &[Language::English];

/// Target options in the order the form lists them.
pub const TARGET_LANGUAGES: &[Language] = &[
    Language::Hindi,
    Language::Marathi,
    Language::Bengali,
    Language::Gujarati,
    Language::Tamil,
    Language::Telugu,
];

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
            Self::Bengali => "bn",
            Self::Gujarati => "gu",
            Self::Tamil => "ta",
            Self::Telugu => "te",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
            Self::Bengali => "Bengali",
            Self::Gujarati => "Gujarati",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
        }
    }

    /// Name of the language in its own script.
    pub fn autonym(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "हिन्दी",
            Self::Marathi => "मराठी",
            Self::Bengali => "বাংলা",
            Self::Gujarati => "ગુજરાતી",
            Self::Tamil => "தமிழ்",
            Self::Telugu => "తెలుగు",
        }
    }

    pub fn espeak_voice(&self) -> &'static str {
        self.code()
    }

    pub fn tesseract_code(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Hindi => "hin",
            Self::Marathi => "mar",
            Self::Bengali => "ben",
            Self::Gujarati => "guj",
            Self::Tamil => "tam",
            Self::Telugu => "tel",
        }
    }

    /// Accepts a display name or ISO code, ignoring case.
    pub fn parse(value: &str) -> Result<Self> {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() {
            return Err(anyhow!("language is empty"));
        }
        ALL_LANGUAGES
            .iter()
            .copied()
            .find(|lang| lang.code() == needle || lang.name().to_lowercase() == needle)
            .ok_or_else(|| {
                anyhow!(
                    "unknown language '{}' (expected one of: {})",
                    value.trim(),
                    names(ALL_LANGUAGES)
                )
            })
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const ALL_LANGUAGES: &[Language] = &[
    Language::English,
    Language::Hindi,
    Language::Marathi,
    Language::Bengali,
    Language::Gujarati,
    Language::Tamil,
    Language::Telugu,
];

pub fn validate_pair(source: Language, target: Language) -> Result<()> {
    if !SOURCE_LANGUAGES.contains(&source) {
        return Err(anyhow!(
            "unsupported source language '{}' (expected one of: {})",
            source,
            names(SOURCE_LANGUAGES)
        ));
    }
    if !TARGET_LANGUAGES.contains(&target) {
        return Err(anyhow!(
            "unsupported target language '{}' (expected one of: {})",
            target,
            names(TARGET_LANGUAGES)
        ));
    }
    Ok(())
}

/// Pretrained model identifier for a language pair, e.g. `Helsinki-NLP/opus-mt-en-hi`.
pub fn model_id(family: &str, source: Language, target: Language) -> String {
    let family = family.trim().trim_end_matches('-');
    let family = if family.is_empty() {
        DEFAULT_MODEL_FAMILY
    } else {
        family
    };
    format!("{}-{}-{}", family, source.code(), target.code())
}

fn names(languages: &[Language]) -> String {
    languages
        .iter()
        .map(Language::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_names_and_codes() {
        assert_eq!(Language::parse("Hindi").unwrap(), Language::Hindi);
        assert_eq!(Language::parse("  tamil ").unwrap(), Language::Tamil);
        assert_eq!(Language::parse("TE").unwrap(), Language::Telugu);
        assert!(Language::parse("French").is_err());
        assert!(Language::parse("   ").is_err());
    }

    #[test]
    fn model_ids_follow_opus_mt_naming() {
        let expected = [
            (Language::Hindi, "Helsinki-NLP/opus-mt-en-hi"),
            (Language::Marathi, "Helsinki-NLP/opus-mt-en-mr"),
            (Language::Bengali, "Helsinki-NLP/opus-mt-en-bn"),
            (Language::Gujarati, "Helsinki-NLP/opus-mt-en-gu"),
            (Language::Tamil, "Helsinki-NLP/opus-mt-en-ta"),
            (Language::Telugu, "Helsinki-NLP/opus-mt-en-te"),
        ];
        for (target, id) in expected {
            assert_eq!(model_id(DEFAULT_MODEL_FAMILY, Language::English, target), id);
        }
        assert_eq!(
            model_id("", Language::English, Language::Hindi),
            "Helsinki-NLP/opus-mt-en-hi"
        );
        assert_eq!(
            model_id("my-org/mt-", Language::English, Language::Tamil),
            "my-org/mt-en-ta"
        );
    }

    #[test]
    fn pair_validation_rejects_english_target() {
        assert!(validate_pair(Language::English, Language::Gujarati).is_ok());
        let err = validate_pair(Language::English, Language::English).unwrap_err();
        assert!(err.to_string().contains("unsupported target language"));
        assert!(validate_pair(Language::Hindi, Language::Tamil).is_err());
    }

    #[test]
    fn target_order_matches_form() {
        let names = TARGET_LANGUAGES
            .iter()
            .map(Language::name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["Hindi", "Marathi", "Bengali", "Gujarati", "Tamil", "Telugu"]
        );
    }
}
