use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{error, info};

use crate::languages::{SOURCE_LANGUAGES, TARGET_LANGUAGES};
use crate::providers::Provider;

use super::models::{
    ErrorResponse, ExtractRequest, ExtractResponse, LanguagesResponse, SpeakRequest,
    SpeakResponse, TranslateRequest, TranslateResponse,
};
use super::page::language_options;
use super::state::ServerState;
use super::translate::{extract_request, speak_request, translate_request, ServerError};

type HandlerError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server<P: Provider + Clone + 'static>(
    state: ServerState<P>,
    addr: &str,
) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("serving on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router<P: Provider + Clone + 'static>(state: ServerState<P>) -> Router {
    // Base64 grows uploads by a third; leave room for the JSON envelope.
    let body_limit = state.settings.max_upload_bytes / 3 * 4 + 64 * 1024;
    Router::new()
        .route("/", get(index::<P>))
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/translate", post(translate::<P>))
        .route("/extract", post(extract::<P>))
        .route("/speak", post(speak::<P>))
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn index<P: Provider + Clone + 'static>(
    State(state): State<Arc<ServerState<P>>>,
) -> Html<String> {
    Html(state.page.clone())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        source: language_options(SOURCE_LANGUAGES),
        target: language_options(TARGET_LANGUAGES),
    })
}

async fn translate<P: Provider + Clone + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, HandlerError> {
    translate_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(into_response_error)
}

async fn extract<P: Provider + Clone + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, HandlerError> {
    extract_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(into_response_error)
}

async fn speak<P: Provider + Clone + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, HandlerError> {
    speak_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(into_response_error)
}

fn into_response_error(err: ServerError) -> HandlerError {
    if err.status.is_server_error() {
        error!("request failed: {}", err.message);
    }
    (err.status, Json(ErrorResponse { error: err.message }))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}
