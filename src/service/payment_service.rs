use crate::config::AppConfig;
use crate::domain::fraud::{FraudAction, FraudAssessment, PaymentAttempt};
use crate::domain::payment::{
    CancelRequest, CreateIntentRequest, CreateIntentResponse, DisputeOutcome, PaymentIntent,
    PaymentIntentStatus, RefundRequest, ResolveDisputeRequest, ServiceDeliveredRequest,
};
use crate::error::EscrowError;
use crate::fees;
use crate::fraud::engine::FraudEngine;
use crate::fx::CurrencyConverter;
use crate::gateways::{AuthorizeRequest, KycService, PaymentGateway};
use crate::lifecycle::machine::{Applied, PaymentEvent};
use crate::store::assessments::AssessmentStore;
use crate::store::escrow_queue::EscrowQueue;
use crate::store::intents::IntentStore;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentService {
    pub config: AppConfig,
    pub intents: IntentStore,
    pub assessments: AssessmentStore,
    pub escrow_queue: EscrowQueue,
    pub fraud: Arc<FraudEngine>,
    pub converter: CurrencyConverter,
    pub gateway: Arc<dyn PaymentGateway>,
    pub kyc: Arc<dyn KycService>,
}

impl PaymentService {
    /// Booking-path entry point: fee split, settlement conversion, fraud
    /// gate, then intent creation and gateway authorization.
    pub async fn create_intent(
        &self,
        req: CreateIntentRequest,
    ) -> Result<CreateIntentResponse, EscrowError> {
        if req.amount_minor <= 0 {
            return Err(EscrowError::AmountInvalid(format!(
                "amount_minor must be positive, got {}",
                req.amount_minor
            )));
        }
        if req.currency.len() != 3 || !req.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(EscrowError::AmountInvalid(format!(
                "currency must be an ISO code, got {:?}",
                req.currency
            )));
        }

        let settlement = &self.config.settlement_currency;
        let conversion = self
            .converter
            .convert(req.amount_minor, &req.currency, settlement)
            .await?;
        if conversion.stale {
            tracing::warn!(
                booking_id = %req.booking_id,
                from = %req.currency,
                to = %settlement,
                "settling on an expired exchange rate"
            );
        }

        // Split is computed on the settled gross so the balance invariant
        // holds by construction in the currency the money moves in.
        let fee_ratio = req
            .fee_ratio_override
            .unwrap_or(self.config.platform_fee_ratio);
        let split = fees::compute_split(conversion.amount_minor, fee_ratio)?;

        let attempt = PaymentAttempt {
            customer_identity: req.customer_identity.clone(),
            amount_minor: conversion.amount_minor,
            currency: settlement.clone(),
            payment_method_fingerprint: req.payment_method_fingerprint.clone(),
            client_ip: req.client_ip.clone(),
            at: Utc::now(),
        };
        let assessment = self.fraud.assess(&attempt).await;
        if assessment.action == FraudAction::Block {
            tracing::warn!(
                booking_id = %req.booking_id,
                identity = %req.customer_identity,
                risk_score = assessment.risk_score,
                "payment attempt blocked"
            );
            return Err(EscrowError::FraudBlocked);
        }

        let now = Utc::now();
        let intent = PaymentIntent {
            id: Uuid::new_v4(),
            booking_id: req.booking_id.clone(),
            consultant_id: req.consultant_id.clone(),
            customer_identity: req.customer_identity.clone(),
            gross_amount_minor: conversion.amount_minor,
            currency: settlement.clone(),
            platform_fee_minor: split.fee_minor,
            consultant_amount_minor: split.consultant_minor,
            refunded_minor: 0,
            status: PaymentIntentStatus::Pending,
            disputed_from: None,
            dispute_reason: None,
            failure_reason: None,
            gateway_reference_id: None,
            manual_attention: false,
            created_at: now,
            paid_at: None,
            service_delivered_at: None,
            payout_released_at: None,
            escrow_release_due_at: None,
        };
        let intent_id = intent.id;
        self.intents.insert(intent).await;
        self.assessments.bind_intent(assessment.id, intent_id).await;

        let authorize = AuthorizeRequest {
            booking_id: req.booking_id.clone(),
            amount_minor: conversion.amount_minor,
            currency: settlement.clone(),
            destination_account: req.consultant_id.clone(),
            fee_amount_minor: split.fee_minor,
        };
        let reference = match self.external(self.gateway.authorize(authorize)).await {
            Ok(reference) => reference,
            Err(err) => {
                let fail = PaymentEvent::Fail {
                    reason: format!("gateway authorization failed: {err}"),
                };
                if let Err(apply_err) = self.intents.apply(intent_id, &fail, Utc::now()).await {
                    tracing::error!(%intent_id, error = %apply_err, "could not fail intent");
                }
                return Err(EscrowError::Internal(
                    err.context("gateway authorization failed"),
                ));
            }
        };
        self.intents
            .record_gateway_reference(intent_id, &reference)
            .await?;

        Ok(CreateIntentResponse {
            intent_id,
            status: PaymentIntentStatus::Pending,
            gateway_reference_id: Some(reference),
            gross_amount_minor: conversion.amount_minor,
            platform_fee_minor: split.fee_minor,
            consultant_amount_minor: split.consultant_minor,
            currency: settlement.clone(),
            risk_action: assessment.action,
        })
    }

    pub async fn mark_service_delivered(
        &self,
        intent_id: Uuid,
        req: ServiceDeliveredRequest,
    ) -> Result<PaymentIntent, EscrowError> {
        let now = Utc::now();
        let release_due_at = now + chrono::Duration::hours(self.config.escrow_hold_hours);
        let event = PaymentEvent::ServiceDelivered {
            delivered_by: req.delivered_by,
            confirmation: req.confirmation,
            release_due_at,
        };
        let (intent, applied) = self.intents.apply(intent_id, &event, now).await?;
        if applied == Applied::Transitioned {
            self.escrow_queue.schedule(intent_id, release_due_at).await;
        }
        Ok(intent)
    }

    /// Attempted by the escrow scheduler once the hold period elapses. The
    /// transition commits before the transfer call; a failed transfer flags
    /// the intent for manual attention rather than rolling back released
    /// state, and the lease prevents a concurrent duplicate transfer.
    pub async fn release_to_consultant(&self, intent_id: Uuid) -> Result<PaymentIntent, EscrowError> {
        let current = self.intents.get(intent_id).await.ok_or(EscrowError::NotFound)?;
        if current.status == PaymentIntentStatus::ReleasedToConsultant {
            // Released but with a failed payout transfer still outstanding:
            // retry the transfer instead of treating this as a no-op.
            if current.manual_attention {
                self.transfer_payout(&current).await?;
                self.intents.clear_manual_attention(intent_id).await;
            }
            return Ok(current);
        }

        let eligible = self
            .external(self.kyc.is_payout_eligible(&current.consultant_id))
            .await
            .context("kyc eligibility check failed")?;
        if !eligible {
            return Err(EscrowError::PayoutIneligible(current.consultant_id));
        }

        let (intent, applied) = self
            .intents
            .apply(intent_id, &PaymentEvent::ReleaseToConsultant, Utc::now())
            .await?;
        if applied == Applied::Unchanged {
            return Ok(intent);
        }

        self.transfer_payout(&intent).await?;
        Ok(intent)
    }

    async fn transfer_payout(&self, intent: &PaymentIntent) -> Result<(), EscrowError> {
        let reference = intent.gateway_reference_id.clone().ok_or_else(|| {
            EscrowError::Internal(anyhow::anyhow!("released intent has no gateway reference"))
        })?;
        if let Err(err) = self
            .external(
                self.gateway
                    .transfer_to_consultant(&reference, intent.consultant_amount_minor),
            )
            .await
        {
            tracing::error!(intent_id = %intent.id, error = %err, "payout transfer failed after release");
            self.intents.flag_manual_attention(intent.id).await;
            return Err(EscrowError::Internal(err.context("payout transfer failed")));
        }
        Ok(())
    }

    pub async fn refund(
        &self,
        intent_id: Uuid,
        req: RefundRequest,
    ) -> Result<PaymentIntent, EscrowError> {
        let current = self.intents.get(intent_id).await.ok_or(EscrowError::NotFound)?;
        let amount_minor = req.amount_minor.unwrap_or(current.refundable_minor());

        let event = PaymentEvent::Refund {
            amount_minor,
            reason: req.reason,
        };
        let (intent, applied) = self.intents.apply(intent_id, &event, Utc::now()).await?;
        if applied == Applied::Unchanged {
            return Ok(intent);
        }

        let reference = intent.gateway_reference_id.clone().ok_or_else(|| {
            EscrowError::Internal(anyhow::anyhow!("refunded intent has no gateway reference"))
        })?;
        if let Err(err) = self
            .external(self.gateway.refund(&reference, amount_minor))
            .await
        {
            tracing::error!(%intent_id, error = %err, "gateway refund failed after state change");
            self.intents.flag_manual_attention(intent_id).await;
            return Err(EscrowError::Internal(err.context("gateway refund failed")));
        }

        Ok(intent)
    }

    pub async fn cancel(
        &self,
        intent_id: Uuid,
        req: CancelRequest,
    ) -> Result<PaymentIntent, EscrowError> {
        let event = PaymentEvent::Fail { reason: req.reason };
        let (intent, _) = self.intents.apply(intent_id, &event, Utc::now()).await?;
        Ok(intent)
    }

    pub async fn resolve_dispute(
        &self,
        intent_id: Uuid,
        req: ResolveDisputeRequest,
    ) -> Result<PaymentIntent, EscrowError> {
        let before = self.intents.get(intent_id).await.ok_or(EscrowError::NotFound)?;
        let event = PaymentEvent::ResolveDispute { outcome: req.outcome };
        let (intent, applied) = self.intents.apply(intent_id, &event, Utc::now()).await?;

        // A dispute opened mid-hold makes the scheduler discard the queue
        // entry as obsolete, so a dismissal that restores SERVICE_DELIVERED
        // must put the release back on the queue or the payout never runs.
        if applied == Applied::Transitioned
            && req.outcome == DisputeOutcome::Dismissed
            && intent.status == PaymentIntentStatus::ServiceDelivered
        {
            if let Some(due_at) = intent.escrow_release_due_at {
                self.escrow_queue.schedule(intent_id, due_at).await;
            }
        }

        if applied == Applied::Transitioned && req.outcome == DisputeOutcome::UpheldForCustomer {
            let refund_minor = before.refundable_minor();
            if let Some(reference) = intent.gateway_reference_id.clone() {
                if refund_minor > 0 {
                    if let Err(err) = self
                        .external(self.gateway.refund(&reference, refund_minor))
                        .await
                    {
                        tracing::error!(%intent_id, error = %err, "dispute refund failed");
                        self.intents.flag_manual_attention(intent_id).await;
                        return Err(EscrowError::Internal(err.context("dispute refund failed")));
                    }
                }
            }
        }

        Ok(intent)
    }

    pub async fn get_status(&self, intent_id: Uuid) -> Result<PaymentIntent, EscrowError> {
        self.intents.get(intent_id).await.ok_or(EscrowError::NotFound)
    }

    pub async fn get_assessment(&self, intent_id: Uuid) -> Result<FraudAssessment, EscrowError> {
        self.assessments
            .for_intent(intent_id)
            .await
            .ok_or(EscrowError::NotFound)
    }

    async fn external<T>(
        &self,
        call: impl std::future::Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let timeout = std::time::Duration::from_millis(self.config.external_call_timeout_ms);
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("external call timed out")),
        }
    }
}
