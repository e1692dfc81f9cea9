use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::warn;

use crate::languages::{self, Language, TARGET_LANGUAGES};
use crate::ocr::{self, OcrOptions, OcrText};
use crate::providers::Provider;
use crate::speech::{self, WAV_MIME};
use crate::translations::TranslateOptions;
use crate::translator::EMPTY_INPUT_WARNING;

use super::models::{
    ExtractRequest, ExtractResponse, SpeakRequest, SpeakResponse, TranslateRequest,
    TranslateResponse,
};
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

pub(crate) async fn translate_request<P: Provider + Clone>(
    state: &ServerState<P>,
    request: TranslateRequest,
) -> Result<TranslateResponse, ServerError> {
    let options = resolve_options(request.source_lang.as_deref(), &request.target_lang)?;
    if request.text.trim().is_empty() {
        return Err(ServerError::bad_request(EMPTY_INPUT_WARNING));
    }

    let exec = state.translator.exec(&request.text, options).await?;
    Ok(TranslateResponse {
        original: request.text,
        translated: exec.text,
        target_lang: options.target.name().to_string(),
        model: exec.model,
    })
}

pub(crate) async fn extract_request<P: Provider + Clone>(
    state: &ServerState<P>,
    request: ExtractRequest,
) -> Result<ExtractResponse, ServerError> {
    let options = resolve_options(request.source_lang.as_deref(), &request.target_lang)?;
    let bytes = decode_upload(&request.image_base64)?;

    let ocr_options = OcrOptions::from_settings(&state.settings);
    let extracted = tokio::task::spawn_blocking(move || -> Result<OcrText, ServerError> {
        let image = ocr::decode_image(&bytes)
            .map_err(|err| ServerError::bad_request(format!("{:#}", err)))?;
        Ok(ocr::recognize(image, &ocr_options)?)
    })
    .await
    .map_err(|err| ServerError::internal(format!("ocr task failed: {}", err)))??;

    if extracted.is_empty() {
        warn!("ocr: no text found in uploaded image");
        return Ok(ExtractResponse {
            extracted: extracted.text,
            translated: None,
            target_lang: options.target.name().to_string(),
            model: None,
            warning: Some(EMPTY_INPUT_WARNING.to_string()),
        });
    }

    let exec = state.translator.exec(&extracted.text, options).await?;
    Ok(ExtractResponse {
        extracted: extracted.text,
        translated: Some(exec.text),
        target_lang: options.target.name().to_string(),
        model: exec.model,
        warning: None,
    })
}

pub(crate) async fn speak_request<P: Provider + Clone>(
    state: &ServerState<P>,
    request: SpeakRequest,
) -> Result<SpeakResponse, ServerError> {
    let language =
        Language::parse(&request.lang).map_err(|err| ServerError::bad_request(err.to_string()))?;
    if request.text.trim().is_empty() {
        return Err(ServerError::bad_request("text is empty"));
    }

    let settings = state.settings.clone();
    let audio =
        tokio::task::spawn_blocking(move || speech::synthesize(&request.text, language, &settings))
            .await
            .map_err(|err| ServerError::internal(format!("speech task failed: {}", err)))??;
    Ok(SpeakResponse {
        mime: WAV_MIME.to_string(),
        audio_base64: BASE64.encode(&audio.wav),
        sample_rate: audio.sample_rate,
        duration_ms: audio.duration_ms,
    })
}

fn resolve_options(
    source: Option<&str>,
    target: &str,
) -> Result<TranslateOptions, ServerError> {
    let source = match source.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Language::parse(value),
        None => Ok(Language::English),
    }
    .map_err(|err| ServerError::bad_request(err.to_string()))?;
    let target = if target.trim().is_empty() {
        TARGET_LANGUAGES[0]
    } else {
        Language::parse(target).map_err(|err| ServerError::bad_request(err.to_string()))?
    };
    languages::validate_pair(source, target)
        .map_err(|err| ServerError::bad_request(err.to_string()))?;
    Ok(TranslateOptions { source, target })
}

fn decode_upload(encoded: &str) -> Result<Vec<u8>, ServerError> {
    let trimmed = encoded.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };
    if payload.is_empty() {
        return Err(ServerError::bad_request("image is required"));
    }
    let compact = payload
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|err| ServerError::bad_request(format!("invalid image_base64: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::translator::tests::TestProvider;
    use crate::translator::Translator;
    #[cfg(unix)]
    use crate::test_util::{fake_espeak, fake_tesseract, png_bytes, wav_bytes};

    fn state(translation: &str) -> (ServerState<TestProvider>, TestProvider) {
        state_with(Settings::default(), translation)
    }

    fn state_with(
        settings: Settings,
        translation: &str,
    ) -> (ServerState<TestProvider>, TestProvider) {
        let provider = TestProvider::returning(translation);
        let state =
            ServerState::new(settings, Translator::new(provider.clone())).expect("state");
        (state, provider)
    }

    #[tokio::test]
    async fn translates_text_with_default_source() {
        let (state, provider) = state("मेरा नाम राम है");
        let response = translate_request(
            &state,
            TranslateRequest {
                text: "My name is Ram".to_string(),
                source_lang: None,
                target_lang: "Marathi".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.translated, "मेरा नाम राम है");
        assert_eq!(response.target_lang, "Marathi");
        assert_eq!(response.model.as_deref(), Some("Helsinki-NLP/opus-mt-en-mr"));
        assert_eq!(provider.seen.lock().unwrap()[0].source, Language::English);
    }

    #[tokio::test]
    async fn empty_text_is_a_bad_request() {
        let (state, provider) = state("unused");
        let err = translate_request(
            &state,
            TranslateRequest {
                text: "  ".to_string(),
                source_lang: Some("English".to_string()),
                target_lang: "hi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, EMPTY_INPUT_WARNING);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_target_is_a_bad_request() {
        let (state, _) = state("unused");
        let err = translate_request(
            &state,
            TranslateRequest {
                text: "hello".to_string(),
                source_lang: None,
                target_lang: "Klingon".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("Klingon"));
    }

    #[tokio::test]
    async fn non_english_source_is_rejected() {
        let (state, _) = state("unused");
        let err = translate_request(
            &state,
            TranslateRequest {
                text: "hello".to_string(),
                source_lang: Some("Hindi".to_string()),
                target_lang: "Tamil".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("source language"));
    }

    #[tokio::test]
    async fn extract_rejects_non_images() {
        let (state, _) = state("unused");
        let err = extract_request(
            &state,
            ExtractRequest {
                image_base64: BASE64.encode(b"just some text"),
                source_lang: None,
                target_lang: "Bengali".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = extract_request(
            &state,
            ExtractRequest {
                image_base64: "%%%".to_string(),
                source_lang: None,
                target_lang: "Bengali".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.message.contains("invalid image_base64"));
    }

    #[tokio::test]
    async fn undecodable_image_is_a_bad_request() {
        let (state, provider) = state("unused");
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(b"garbage after the signature");
        let err = extract_request(
            &state,
            ExtractRequest {
                image_base64: BASE64.encode(&bytes),
                source_lang: None,
                target_lang: "Hindi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("failed to decode image"));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn extract_translates_recognized_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.ocr_command = fake_tesseract(dir.path(), "Good morning\n\x0c");
        let (state, provider) = state_with(settings, "সুপ্রভাত");

        let response = extract_request(
            &state,
            ExtractRequest {
                image_base64: format!("data:image/png;base64,{}", BASE64.encode(png_bytes())),
                source_lang: None,
                target_lang: "Bengali".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.extracted, "Good morning");
        assert_eq!(response.translated.as_deref(), Some("সুপ্রভাত"));
        assert_eq!(response.target_lang, "Bengali");
        assert!(response.warning.is_none());
        assert_eq!(provider.seen.lock().unwrap()[0].text, "Good morning");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn image_without_text_warns_instead_of_translating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.ocr_command = fake_tesseract(dir.path(), " \n\x0c\n");
        let (state, provider) = state_with(settings, "unused");

        let response = extract_request(
            &state,
            ExtractRequest {
                image_base64: BASE64.encode(png_bytes()),
                source_lang: None,
                target_lang: "Gujarati".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.extracted, "");
        assert!(response.translated.is_none());
        assert_eq!(response.warning.as_deref(), Some(EMPTY_INPUT_WARNING));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn speak_returns_wav_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.speech_engine = Some(fake_espeak(dir.path(), &wav_bytes(16000, 1, 8000)));
        let (state, _) = state_with(settings, "unused");

        let response = speak_request(
            &state,
            SpeakRequest {
                text: "నమస్కారం".to_string(),
                lang: "te".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.mime, "audio/wav");
        assert_eq!(response.sample_rate, 16000);
        assert_eq!(response.duration_ms, 500);
        let wav = BASE64.decode(response.audio_base64).expect("base64");
        assert_eq!(wav, wav_bytes(16000, 1, 8000));
    }

    #[tokio::test]
    async fn speak_validates_input() {
        let (state, _) = state("unused");
        let err = speak_request(
            &state,
            SpeakRequest {
                text: "नमस्ते".to_string(),
                lang: "French".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = speak_request(
            &state,
            SpeakRequest {
                text: " ".to_string(),
                lang: "Hindi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "text is empty");
    }

    #[test]
    fn data_urls_are_unwrapped() {
        let encoded = format!("data:image/png;base64,{}", BASE64.encode([1u8, 2, 3]));
        assert_eq!(decode_upload(&encoded).unwrap(), vec![1, 2, 3]);
        let wrapped = "AQ\nID";
        assert_eq!(decode_upload(wrapped).unwrap(), vec![1, 2, 3]);
        assert!(decode_upload("data:image/png;base64,").is_err());
    }

    #[test]
    fn blank_target_defaults_to_first_option() {
        let options = resolve_options(None, "").unwrap();
        assert_eq!(options.target, Language::Hindi);
    }
}
