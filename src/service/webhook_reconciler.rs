use crate::error::EscrowError;
use crate::gateways::{GatewayEvent, GatewayEventType};
use crate::lifecycle::machine::{Applied, PaymentEvent};
use crate::store::intents::IntentStore;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    Duplicate,
    Discarded,
}

/// Applies asynchronous gateway notifications to local intents. Delivery is
/// at-least-once and possibly reordered; duplicates land on the idempotent
/// no-op arms of the transition table, and a stale or conflicting event is
/// rejected by the table and discarded here with a log line.
#[derive(Clone)]
pub struct WebhookReconciler {
    pub intents: IntentStore,
    discarded: Arc<AtomicU64>,
}

impl WebhookReconciler {
    pub fn new(intents: IntentStore) -> Self {
        Self {
            intents,
            discarded: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::SeqCst)
    }

    pub async fn process(&self, event: GatewayEvent) -> Result<ReconcileOutcome, EscrowError> {
        let Some(intent) = self
            .intents
            .find_by_gateway_reference(&event.gateway_reference_id)
            .await
        else {
            tracing::warn!(
                gateway_reference_id = %event.gateway_reference_id,
                event_type = ?event.event_type,
                "gateway event references unknown payment, discarding"
            );
            self.discarded.fetch_add(1, Ordering::SeqCst);
            return Ok(ReconcileOutcome::Discarded);
        };

        let outcome = match event.event_type {
            GatewayEventType::ChargeSucceeded => {
                let paid = PaymentEvent::MarkPaid {
                    gateway_reference_id: event.gateway_reference_id.clone(),
                };
                match self.apply(intent.id, &paid).await? {
                    ReconcileOutcome::Applied => {
                        // Funds are held as soon as the charge confirms.
                        self.apply(intent.id, &PaymentEvent::MoveToEscrow).await?
                    }
                    other => other,
                }
            }
            GatewayEventType::ChargeFailed => {
                let reason = event
                    .payload
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("charge failed at gateway")
                    .to_string();
                self.apply(intent.id, &PaymentEvent::Fail { reason }).await?
            }
            GatewayEventType::DisputeOpened => {
                let reason = event
                    .payload
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("dispute opened at gateway")
                    .to_string();
                self.apply(intent.id, &PaymentEvent::OpenDispute { reason })
                    .await?
            }
            GatewayEventType::RefundCompleted => {
                let amount_minor = event
                    .payload
                    .get("amount_minor")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(intent.refundable_minor());
                self.apply(
                    intent.id,
                    &PaymentEvent::Refund {
                        amount_minor,
                        reason: "refund completed at gateway".to_string(),
                    },
                )
                .await?
            }
        };

        Ok(outcome)
    }

    async fn apply(
        &self,
        intent_id: uuid::Uuid,
        event: &PaymentEvent,
    ) -> Result<ReconcileOutcome, EscrowError> {
        match self.intents.apply(intent_id, event, Utc::now()).await {
            Ok((_, Applied::Transitioned)) => Ok(ReconcileOutcome::Applied),
            Ok((_, Applied::Unchanged)) => Ok(ReconcileOutcome::Duplicate),
            Err(EscrowError::InvalidTransition(detail)) => {
                tracing::warn!(%intent_id, detail, "conflicting gateway event, discarding");
                self.discarded.fetch_add(1, Ordering::SeqCst);
                Ok(ReconcileOutcome::Discarded)
            }
            Err(EscrowError::AmountInvalid(detail)) => {
                tracing::warn!(%intent_id, detail, "gateway refund event out of bounds, discarding");
                self.discarded.fetch_add(1, Ordering::SeqCst);
                Ok(ReconcileOutcome::Discarded)
            }
            Err(err) => Err(err),
        }
    }
}
