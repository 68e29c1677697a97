use crate::domain::fraud::{FraudAction, FraudAssessment, PaymentAttempt, RiskBreakdown};
use crate::fraud::history::{AttemptHistory, AttemptRecord};
use crate::fraud::types::{factors, RiskPolicy};
use crate::gateways::IpReputation;
use crate::store::assessments::AssessmentStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Additive fraud scoring over independent, individually capped signals.
/// Sits on the booking request path, so it never returns an error: any
/// failing signal degrades the outcome to at least `Review` (fail-closed)
/// and tags the assessment with `assessment_error`.
pub struct FraudEngine {
    pub policy: RiskPolicy,
    pub history: AttemptHistory,
    pub reputation: Arc<dyn IpReputation>,
    pub assessments: AssessmentStore,
}

impl FraudEngine {
    pub async fn assess(&self, attempt: &PaymentAttempt) -> FraudAssessment {
        let mut factors_seen = Vec::new();
        let mut breakdown = RiskBreakdown::default();
        let mut degraded = false;

        let spend = self
            .history
            .daily_spend_minor(&attempt.customer_identity, attempt.at)
            .await;
        if spend + attempt.amount_minor > self.policy.daily_spend_ceiling_minor {
            breakdown.daily_spend = self.policy.daily_spend_points;
            factors_seen.push(factors::DAILY_SPEND_CEILING.to_string());
        }

        let recent = self
            .history
            .attempts_within(
                &attempt.customer_identity,
                self.policy.velocity_window,
                attempt.at,
            )
            .await;
        if recent >= self.policy.velocity_max_attempts {
            breakdown.velocity = self.policy.velocity_points;
            factors_seen.push(factors::VELOCITY.to_string());
        }

        if let Some(ip) = &attempt.client_ip {
            let lookup =
                tokio::time::timeout(self.policy.signal_timeout, self.reputation.reputation(ip))
                    .await;
            match lookup {
                Ok(Ok(score)) => {
                    let graded =
                        (score.min(100) * self.policy.ip_reputation_max_points).div_euclid(100);
                    if graded > 0 {
                        breakdown.ip_reputation = graded;
                        factors_seen.push(factors::IP_REPUTATION.to_string());
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "ip reputation lookup failed");
                    degraded = true;
                }
                Err(_) => {
                    tracing::warn!("ip reputation lookup timed out");
                    degraded = true;
                }
            }
        }

        if let Some((samples, mean)) = self.history.amount_mean(&attempt.customer_identity).await {
            if samples >= self.policy.amount_outlier_min_history
                && Decimal::from(attempt.amount_minor) > mean * self.policy.amount_outlier_multiplier
            {
                breakdown.amount_outlier = self.policy.amount_outlier_points;
                factors_seen.push(factors::AMOUNT_OUTLIER.to_string());
            }
        }

        if let Some(fingerprint) = &attempt.payment_method_fingerprint {
            let known = self
                .history
                .known_fingerprints(&attempt.customer_identity)
                .await;
            if !known.is_empty() && !known.contains(fingerprint) {
                // Graded by how established the identity's prior usage is.
                let graded = ((known.len() as u32) * 5).min(self.policy.method_mismatch_max_points);
                breakdown.method_mismatch = graded;
                factors_seen.push(factors::METHOD_MISMATCH.to_string());
            }
        }

        breakdown.total = (breakdown.daily_spend
            + breakdown.velocity
            + breakdown.ip_reputation
            + breakdown.amount_outlier
            + breakdown.method_mismatch)
            .min(100);

        let mut action = if breakdown.total >= self.policy.block_threshold {
            FraudAction::Block
        } else if breakdown.total >= self.policy.review_threshold {
            FraudAction::Review
        } else {
            FraudAction::Approve
        };

        if degraded {
            factors_seen.push(factors::ASSESSMENT_ERROR.to_string());
            if action == FraudAction::Approve {
                action = FraudAction::Review;
            }
        }

        let assessment = FraudAssessment {
            id: Uuid::new_v4(),
            payment_intent_id: None,
            customer_identity: attempt.customer_identity.clone(),
            risk_score: breakdown.total,
            risk_factors: factors_seen,
            action,
            breakdown,
            assessed_at: attempt.at,
        };

        // Audit trail first, result second; blocked attempts are recorded too.
        self.assessments.append(assessment.clone()).await;
        self.history
            .record(
                &attempt.customer_identity,
                AttemptRecord {
                    amount_minor: attempt.amount_minor,
                    at: attempt.at,
                    method_fingerprint: attempt.payment_method_fingerprint.clone(),
                },
            )
            .await;

        assessment
    }
}
