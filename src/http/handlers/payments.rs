use crate::domain::payment::{
    CancelRequest, CreateIntentRequest, RefundRequest, ResolveDisputeRequest,
    ServiceDeliveredRequest,
};
use crate::error::EscrowError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn create_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> impl IntoResponse {
    match state.payment_service.create_intent(req).await {
        Ok(resp) => (axum::http::StatusCode::CREATED, Json(resp)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payment_service.get_status(intent_id).await {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_assessment(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payment_service.get_assessment(intent_id).await {
        Ok(assessment) => (axum::http::StatusCode::OK, Json(assessment)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn mark_service_delivered(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
    Json(req): Json<ServiceDeliveredRequest>,
) -> impl IntoResponse {
    match state
        .payment_service
        .mark_service_delivered(intent_id, req)
        .await
    {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn refund(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
    Json(req): Json<RefundRequest>,
) -> impl IntoResponse {
    match state.payment_service.refund(intent_id, req).await {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> impl IntoResponse {
    match state.payment_service.cancel(intent_id, req).await {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn resolve_dispute(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
    Json(req): Json<ResolveDisputeRequest>,
) -> impl IntoResponse {
    match state.payment_service.resolve_dispute(intent_id, req).await {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

pub(crate) fn error_response(err: EscrowError) -> axum::response::Response {
    (err.status(), Json(err.envelope())).into_response()
}
