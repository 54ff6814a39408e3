//! HTTP surface: the chatbot endpoint plus a health probe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, instrument};

use crate::chat::{ChatAgent, ChatReply};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Build the router. CORS is restricted to the configured frontend origin.
pub fn router(agent: Arc<ChatAgent>, allowed_origin: &str) -> Result<Router, anyhow::Error> {
    let origin: HeaderValue = allowed_origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/chatbot", post(chatbot))
        .route("/health", get(health))
        .layer(cors)
        .with_state(agent))
}

/// POST /api/chatbot
///
/// Sessions are keyed by the client-supplied `session_id` when present,
/// falling back to the peer address.
#[instrument(skip_all)]
async fn chatbot(
    State(agent): State<Arc<ChatAgent>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<Value>)> {
    let session = body
        .session_id
        .clone()
        .unwrap_or_else(|| addr.ip().to_string());
    info!(%session, "received chat query");
    metrics::inc_chat_request();

    match agent.respond(&session, &body.query).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            error!(error = %e, "chat handler failed");
            metrics::inc_chat_error(&e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_decodes_with_session() {
        let body: ChatRequest =
            serde_json::from_str(r#"{"query": "hi", "session_id": "abc"}"#).expect("decodes");
        assert_eq!(body.query, "hi");
        assert_eq!(body.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_chat_request_session_optional() {
        let body: ChatRequest = serde_json::from_str(r#"{"query": "hi"}"#).expect("decodes");
        assert_eq!(body.session_id, None);
    }

    #[test]
    fn test_chat_request_requires_query() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"session_id": "abc"}"#).is_err());
    }

    #[test]
    fn test_reply_serializes_expected_shape() {
        let reply = ChatReply {
            message: "hello".into(),
            flight_info: json!([]),
        };
        let encoded = serde_json::to_value(&reply).expect("encodes");
        assert_eq!(encoded, json!({"message": "hello", "flight_info": []}));
    }
}
