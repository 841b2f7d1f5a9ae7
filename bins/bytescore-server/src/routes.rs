use crate::AppState;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/bytescore", get(bytescore))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

// ── /api/bytescore ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ScoreQuery {
    address: Option<String>,
}

/// Dropping this handler's future (client disconnect) aborts the engine's
/// in-flight fetches.
async fn bytescore(State(s): State<AppState>, Query(q): Query<ScoreQuery>) -> Response {
    let Some(address) = q.address.filter(|a| !a.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Wallet address is required" })),
        )
            .into_response();
    };

    let result = s.engine.compute_reputation_score(&address).await;
    Json(result).into_response()
}

// ── /api/health ──────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use bytescore_core::config::ScoringConfig;
    use bytescore_core::error::LedgerError;
    use bytescore_core::traits::{MockLedgerReader, MockPlatformHistory};
    use bytescore_core::types::ScoreResult;
    use bytescore_engine::ScoringEngine;
    use tower::ServiceExt;

    /// Router over a ledger that is unreachable, so every valid account
    /// resolves to the fallback.
    fn app() -> Router {
        let mut ledger = MockLedgerReader::new();
        ledger
            .expect_signatures()
            .returning(|_, _| Err(LedgerError::Transport("offline".into())));
        ledger
            .expect_transaction()
            .returning(|_| Err(LedgerError::Transport("offline".into())));
        ledger
            .expect_token_mints()
            .returning(|_| Err(LedgerError::Transport("offline".into())));
        let mut history = MockPlatformHistory::new();
        history.expect_obligations().returning(|_| Ok(vec![]));

        let engine =
            ScoringEngine::new(Arc::new(ledger), Arc::new(history), ScoringConfig::new()).unwrap();
        router(AppState { engine: Arc::new(engine) })
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_address_is_bad_request() {
        let (status, body) = get("/api/bytescore").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Wallet address is required" }));
    }

    #[tokio::test]
    async fn empty_address_is_bad_request() {
        let (status, _) = get("/api/bytescore?address=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Only a missing or empty parameter is rejected; blanks are scored.
    #[tokio::test]
    async fn blank_address_returns_fallback_score() {
        let (status, body) = get("/api/bytescore?address=%20%20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 50);
    }

    #[tokio::test]
    async fn invalid_address_returns_fallback_score() {
        let (status, body) = get("/api/bytescore?address=definitely-not-valid").await;
        assert_eq!(status, StatusCode::OK);
        let result: ScoreResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.score, 50);
        assert_eq!(result.breakdown.transaction_frequency, 10);
    }

    #[tokio::test]
    async fn valid_address_returns_score_shape() {
        let (status, body) =
            get("/api/bytescore?address=8TY7cVY8xke4wqdigNHUAfJv7vPyUXLAePQCPMKdym65").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["breakdown"]["redFlags"].is_u64());
        assert!(body["metrics"]["volumeSOL"].is_number());
        assert_eq!(body["metrics"]["repaymentRatio"], 0.5);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
