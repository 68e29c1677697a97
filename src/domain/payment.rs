use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentIntentStatus {
    Pending,
    Paid,
    HeldInEscrow,
    ServiceDelivered,
    ReleasedToConsultant,
    Disputed,
    Refunded,
    Failed,
}

impl PaymentIntentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::ReleasedToConsultant
                | PaymentIntentStatus::Refunded
                | PaymentIntentStatus::Failed
        )
    }
}

/// One escrowed payment per booking attempt. Monetary fields are integer
/// minor units and `gross == platform_fee + consultant_amount` holds in
/// every state; intents are never deleted, terminal states stay for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub booking_id: String,
    pub consultant_id: String,
    pub customer_identity: String,
    pub gross_amount_minor: i64,
    pub currency: String,
    pub platform_fee_minor: i64,
    pub consultant_amount_minor: i64,
    pub refunded_minor: i64,
    pub status: PaymentIntentStatus,
    pub disputed_from: Option<PaymentIntentStatus>,
    pub dispute_reason: Option<String>,
    pub failure_reason: Option<String>,
    pub gateway_reference_id: Option<String>,
    pub manual_attention: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub service_delivered_at: Option<DateTime<Utc>>,
    pub payout_released_at: Option<DateTime<Utc>>,
    pub escrow_release_due_at: Option<DateTime<Utc>>,
}

impl PaymentIntent {
    pub fn balanced(&self) -> bool {
        self.gross_amount_minor == self.platform_fee_minor + self.consultant_amount_minor
    }

    pub fn refundable_minor(&self) -> i64 {
        self.gross_amount_minor - self.refunded_minor
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntentRequest {
    pub booking_id: String,
    pub consultant_id: String,
    pub customer_identity: String,
    pub amount_minor: i64,
    pub currency: String,
    pub fee_ratio_override: Option<rust_decimal::Decimal>,
    pub payment_method_fingerprint: Option<String>,
    pub client_ip: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIntentResponse {
    pub intent_id: Uuid,
    pub status: PaymentIntentStatus,
    pub gateway_reference_id: Option<String>,
    pub gross_amount_minor: i64,
    pub platform_fee_minor: i64,
    pub consultant_amount_minor: i64,
    pub currency: String,
    pub risk_action: crate::domain::fraud::FraudAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDeliveredRequest {
    pub delivered_by: String,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    /// Omitted means full refund of the remaining refundable amount.
    pub amount_minor: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeOutcome {
    UpheldForCustomer,
    Dismissed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveDisputeRequest {
    pub outcome: DisputeOutcome,
}
