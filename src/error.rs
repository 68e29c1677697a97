use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("escrow hold period has not elapsed, due at {due_at}")]
    EscrowNotDue { due_at: chrono::DateTime<chrono::Utc> },
    #[error("consultant {0} is not payout-eligible")]
    PayoutIneligible(String),
    #[error("no exchange rate available for {from}->{to}")]
    RateUnavailable { from: String, to: String },
    #[error("payment attempt blocked by fraud screening")]
    FraudBlocked,
    #[error("invalid amount: {0}")]
    AmountInvalid(String),
    #[error("payment intent not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EscrowError {
    pub fn code(&self) -> &'static str {
        match self {
            EscrowError::InvalidTransition(_) => "INVALID_TRANSITION",
            EscrowError::EscrowNotDue { .. } => "ESCROW_NOT_DUE",
            EscrowError::PayoutIneligible(_) => "PAYOUT_INELIGIBLE",
            EscrowError::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            EscrowError::FraudBlocked => "FRAUD_BLOCKED",
            EscrowError::AmountInvalid(_) => "INVALID_AMOUNT",
            EscrowError::NotFound => "NOT_FOUND",
            EscrowError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EscrowError::InvalidTransition(_) => StatusCode::CONFLICT,
            EscrowError::EscrowNotDue { .. } => StatusCode::CONFLICT,
            EscrowError::PayoutIneligible(_) => StatusCode::CONFLICT,
            EscrowError::RateUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            EscrowError::FraudBlocked => StatusCode::FORBIDDEN,
            EscrowError::AmountInvalid(_) => StatusCode::BAD_REQUEST,
            EscrowError::NotFound => StatusCode::NOT_FOUND,
            EscrowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
