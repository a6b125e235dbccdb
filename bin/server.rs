// Wiki Answer - Web Server
// Chat front-end over the answer service (REST API with Axum)

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        header::{ACCEPT_LANGUAGE, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wiki_answer::{init_tracing, Answer, AnswerService, Config, Language};

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<AnswerService>,
    default_language: Language,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

/// Body of /ask and /more; a missing or malformed body counts as empty
#[derive(Debug, Default, Deserialize)]
struct QuestionRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Serialize)]
struct LanguageInfo {
    code: &'static str,
    name: &'static str,
}

#[derive(Serialize)]
struct DescribeResponse {
    id: String,
    lang: Language,
    text: String,
}

// ============================================================================
// Language resolution
// ============================================================================

/// Explicit → `lang` cookie → Accept-Language → configured default
fn request_language(explicit: Option<&str>, headers: &HeaderMap, default: Language) -> Language {
    if let Some(lang) = explicit.and_then(|l| l.parse().ok()) {
        return lang;
    }

    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("lang="))
        .find_map(|v| v.parse().ok());
    if let Some(lang) = from_cookie {
        return lang;
    }

    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(Language::best_match)
        .unwrap_or(default)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Serve the chat page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// GET /set_lang/:lang - Remember the language in a cookie
async fn set_lang(Path(lang): Path<String>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();

    match lang.parse::<Language>() {
        Ok(lang) => {
            let cookie = format!("lang={}; Path=/; SameSite=Lax", lang.code());
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(SET_COOKIE, value);
            }
        }
        Err(_) => tracing::debug!(lang = %lang, "ignoring unsupported language"),
    }

    (headers, Json(serde_json::json!({ "status": "ok" })))
}

/// POST /ask - Answer a question (preview when several hits)
async fn ask(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let req: QuestionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let lang = request_language(req.lang.as_deref(), &headers, state.default_language);

    answer_blocking(&state, move |service| service.ask(&req.question, lang)).await
}

/// POST /more - Full descriptions of every hit
async fn more(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let req: QuestionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let lang = request_language(req.lang.as_deref(), &headers, state.default_language);

    answer_blocking(&state, move |service| service.more(&req.question, lang)).await
}

/// Pipeline calls block on the network; keep them off the async workers
async fn answer_blocking<F>(state: &AppState, f: F) -> Response
where
    F: FnOnce(&AnswerService) -> Answer + Send + 'static,
{
    let service = state.service.clone();

    match tokio::task::spawn_blocking(move || f(&service)).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "answer task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err((), "internal error")),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/languages - Supported languages
async fn get_languages() -> impl IntoResponse {
    let languages: Vec<LanguageInfo> = Language::ALL
        .iter()
        .map(|l| LanguageInfo {
            code: l.code(),
            name: l.display_name(),
        })
        .collect();

    Json(ApiResponse::ok(languages))
}

/// GET /api/describe/:id - Describe a known entity
async fn describe_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Response {
    let lang = request_language(query.lang.as_deref(), &headers, state.default_language);
    let service = state.service.clone();
    let id = id.trim().to_string();

    let task_id = id.clone();
    match tokio::task::spawn_blocking(move || service.pipeline().describe(&task_id, lang)).await {
        Ok(text) => Json(ApiResponse::ok(DescribeResponse { id, lang, text })).into_response(),
        Err(e) => {
            tracing::error!(id = %id, error = %e, "describe task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err((), "internal error")),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/languages", get(get_languages))
        .route("/describe/:id", get(describe_entity))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/set_lang/:lang", get(set_lang))
        .route("/ask", post(ask))
        .route("/more", post(more))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn serve(state: AppState, addr: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server running");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

fn main() -> Result<()> {
    init_tracing("wiki_answer=info,wiki_answer_server=info,tower_http=info");

    let config = Config::from_env()?;

    // The blocking HTTP client must be created and dropped outside the runtime
    let service = Arc::new(AnswerService::from_config(&config)?);
    let state = AppState {
        service: service.clone(),
        default_language: config.default_language,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let result = runtime.block_on(serve(state, config.bind_addr.clone()));
    drop(runtime);
    drop(service);
    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_language_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        assert_eq!(request_language(None, &headers, Language::Ru), Language::Zh);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        assert_eq!(request_language(None, &headers, Language::Ru), Language::En);

        assert_eq!(request_language(Some("ru"), &headers, Language::Zh), Language::Ru);
        assert_eq!(request_language(Some("xx"), &headers, Language::Zh), Language::En);
    }

    #[test]
    fn test_request_language_default() {
        let headers = HeaderMap::new();
        assert_eq!(request_language(None, &headers, Language::Ru), Language::Ru);
    }

    #[test]
    fn test_question_request_lenient() {
        let req: QuestionRequest = serde_json::from_slice(b"not json").unwrap_or_default();
        assert_eq!(req.question, "");

        let req: QuestionRequest =
            serde_json::from_slice(br#"{"question": "Einstein", "lang": "en"}"#).unwrap();
        assert_eq!(req.question, "Einstein");
        assert_eq!(req.lang.as_deref(), Some("en"));
    }
}
