//! HTTP API for the search agent.
//!
//! Thin transport over the orchestration core: request validation,
//! thread resolution, and the source-extraction fallback live here;
//! everything else is the agent's concern.

pub mod types;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::{extract_sources, Agent, InMemoryStateStore, ThreadRegistry};
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::tools::{TavilySearch, ToolRegistry};

use types::{AgentRequest, AgentResponse, ErrorResponse, HealthResponse, ResetResponse};

/// Shared application state.
pub struct AppState {
    pub agent: Agent,
    pub threads: ThreadRegistry,
}

/// Build the API router.
pub fn routes(state: Arc<AppState>) -> Router {
    // The original deployment served browser clients from anywhere, so
    // CORS stays wide open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/agent", post(submit_query))
        .route("/agent/:conversation_id/reset", post(reset_conversation))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn submit_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "query must not be empty".to_string(),
            }),
        ));
    }

    let conversation_id = request.conversation_id.as_deref();
    let thread_id = state.threads.get_or_create(conversation_id).await;
    info!(
        %thread_id,
        conversation_id = conversation_id.unwrap_or("-"),
        "query accepted"
    );

    let outcome = state.agent.run(&request.query, &thread_id).await;

    // Structured sources from tools win; otherwise recover citations
    // from the answer text.
    let sources = if outcome.sources.is_empty() {
        extract_sources(&outcome.answer)
    } else {
        outcome.sources
    };

    Ok(Json(AgentResponse {
        answer: outcome.answer,
        sources,
        thread_id: Some(thread_id),
    }))
}

async fn reset_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Json<ResetResponse> {
    let thread_id = state.threads.reset(&conversation_id).await;
    info!(%conversation_id, %thread_id, "conversation reset");
    Json(ResetResponse { thread_id })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Wire up the agent from configuration and serve the API.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.call_timeout,
    )?);

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(TavilySearch::new(
        config.tavily_api_key.clone(),
        config.call_timeout,
    )?));

    let store = Arc::new(InMemoryStateStore::new(config.thread_ttl));
    let agent = Agent::new(llm, tools, store, &config);
    let threads = ThreadRegistry::new(config.thread_ttl);

    let state = Arc::new(AppState { agent, threads });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, routes(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = Config::new("test-key".to_string(), "test-key".to_string());
        let llm = Arc::new(
            OpenAiClient::new(config.openai_api_key.clone(), config.call_timeout)
                .expect("client builds"),
        );
        let store = Arc::new(InMemoryStateStore::new(config.thread_ttl));
        let agent = Agent::new(llm, ToolRegistry::new(), store, &config);
        Arc::new(AppState {
            agent,
            threads: ThreadRegistry::new(config.thread_ttl),
        })
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let app = routes(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request served");

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let health: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_the_agent_runs() {
        let app = routes(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "   "}"#))
                    .expect("request builds"),
            )
            .await
            .expect("request served");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_returns_a_fresh_thread_id() {
        let state = test_state();
        let app = routes(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/conv-1/reset")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request served");

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let reset: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        let thread_id = reset["thread_id"].as_str().expect("thread id present");

        // The registry now resolves the conversation to the reset id.
        assert_eq!(
            state.threads.get_or_create(Some("conv-1")).await,
            thread_id
        );
    }
}
