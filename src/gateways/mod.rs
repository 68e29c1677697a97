use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod mock;

#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub booking_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub destination_account: String,
    pub fee_amount_minor: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEventType {
    #[serde(rename = "charge.succeeded")]
    ChargeSucceeded,
    #[serde(rename = "charge.failed")]
    ChargeFailed,
    #[serde(rename = "dispute.opened")]
    DisputeOpened,
    #[serde(rename = "refund.completed")]
    RefundCompleted,
}

/// Wire shape of a gateway webhook notification. Delivery is at-least-once
/// and possibly reordered, so every consumer of these must be idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub event_type: GatewayEventType,
    pub gateway_reference_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authorize(&self, request: AuthorizeRequest) -> Result<String>;

    async fn refund(&self, gateway_reference_id: &str, amount_minor: i64) -> Result<()>;

    async fn transfer_to_consultant(
        &self,
        gateway_reference_id: &str,
        amount_minor: i64,
    ) -> Result<()>;
}

#[async_trait::async_trait]
pub trait KycService: Send + Sync {
    async fn is_payout_eligible(&self, consultant_id: &str) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    async fn spot_rate(&self, from: &str, to: &str) -> Result<Decimal>;
}

/// Network reputation lookup, 0 (clean) to 100 (known bad).
#[async_trait::async_trait]
pub trait IpReputation: Send + Sync {
    async fn reputation(&self, ip: &str) -> Result<u32>;
}
