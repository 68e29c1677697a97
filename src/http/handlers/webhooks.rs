use crate::gateways::GatewayEvent;
use crate::http::handlers::payments::error_response;
use crate::service::webhook_reconciler::ReconcileOutcome;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

/// Gateway webhook ingress. Always acknowledges with 200 once the event has
/// been examined, including duplicates and unknown references, so the
/// gateway stops redelivering; only internal failures return 5xx for retry.
pub async fn gateway_event(
    State(state): State<AppState>,
    Json(event): Json<GatewayEvent>,
) -> impl IntoResponse {
    match state.reconciler.process(event).await {
        Ok(outcome) => {
            let status = match outcome {
                ReconcileOutcome::Applied => "applied",
                ReconcileOutcome::Duplicate => "duplicate",
                ReconcileOutcome::Discarded => "discarded",
            };
            (
                axum::http::StatusCode::OK,
                Json(serde_json::json!({ "result": status })),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}
