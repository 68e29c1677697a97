use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}

/// Manual-intervention queue for operators: intents whose scheduler retries
/// exhausted or whose money movement failed mid-flight, plus the stuck
/// escrow entries themselves.
pub async fn attention(State(state): State<AppState>) -> impl IntoResponse {
    let intents = state.payment_service.intents.list_manual_attention().await;
    let entries = state.escrow_queue.list_manual_attention().await;
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "intents": intents,
            "escrow_entries": entries,
            "discarded_webhook_events": state.reconciler.discarded_count(),
        })),
    )
        .into_response()
}
