use indic_translator::server::{self, LanguagesResponse, ServerState, TranslateResponse};
use indic_translator::settings::Settings;
use indic_translator::{Provider, ProviderFuture, ProviderResponse, TranslationRequest, Translator};

#[derive(Clone)]
struct UppercaseProvider;

impl Provider for UppercaseProvider {
    fn translate(self, request: TranslationRequest) -> ProviderFuture {
        Box::pin(async move {
            Ok(ProviderResponse {
                translation: format!("[{}] {}", request.target.code(), request.text.to_uppercase()),
                model: Some("stub".to_string()),
                usage: None,
            })
        })
    }
}

async fn spawn_server() -> String {
    let state = ServerState::new(Settings::default(), Translator::new(UppercaseProvider))
        .expect("state");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, server::router(state))
            .await
            .expect("serve");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn translate_round_trip_over_http() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/translate", base))
        .json(&serde_json::json!({"text": "good morning", "target_lang": "Tamil"}))
        .send()
        .await
        .expect("send");
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    let body: TranslateResponse = response.json().await.expect("json");
    assert_eq!(body.translated, "[ta] GOOD MORNING");
    assert_eq!(body.target_lang, "Tamil");
    assert_eq!(body.model.as_deref(), Some("stub"));
}

#[tokio::test]
async fn empty_text_returns_warning() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/translate", base))
        .json(&serde_json::json!({"text": "", "target_lang": "Hindi"}))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Please enter some text for translation.");
}

#[tokio::test]
async fn page_and_metadata_routes() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{}/", base))
        .send()
        .await
        .expect("send")
        .text()
        .await
        .expect("text");
    assert!(page.contains("Indian Language Translator with Speech Output"));

    let health: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(health["status"], "ok");

    let languages: LanguagesResponse = client
        .get(format!("{}/languages", base))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(languages.source.len(), 1);
    assert_eq!(languages.source[0].value, "English");
    assert_eq!(languages.target.len(), 6);
    assert_eq!(languages.target[5].autonym, "తెలుగు");

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/translate", base))
        .send()
        .await
        .expect("send");
    assert_eq!(preflight.status().as_u16(), 204);
}
