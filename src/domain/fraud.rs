use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub customer_identity: String,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method_fingerprint: Option<String>,
    pub client_ip: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudAction {
    Approve,
    Review,
    Block,
}

/// Append-only audit record, written before the assessment result is
/// returned to the booking path. `payment_intent_id` starts empty because
/// assessment happens before the intent exists; it is bound afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub id: Uuid,
    pub payment_intent_id: Option<Uuid>,
    pub customer_identity: String,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub action: FraudAction,
    pub breakdown: RiskBreakdown,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub daily_spend: u32,
    pub velocity: u32,
    pub ip_reputation: u32,
    pub amount_outlier: u32,
    pub method_mismatch: u32,
    pub total: u32,
}
