use crate::domain::payment::{DisputeOutcome, PaymentIntent, PaymentIntentStatus};
use crate::error::EscrowError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum PaymentEvent {
    MarkPaid {
        gateway_reference_id: String,
    },
    MoveToEscrow,
    ServiceDelivered {
        delivered_by: String,
        confirmation: Option<String>,
        release_due_at: DateTime<Utc>,
    },
    ReleaseToConsultant,
    OpenDispute {
        reason: String,
    },
    ResolveDispute {
        outcome: DisputeOutcome,
    },
    Refund {
        amount_minor: i64,
        reason: String,
    },
    Fail {
        reason: String,
    },
}

impl PaymentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentEvent::MarkPaid { .. } => "mark_paid",
            PaymentEvent::MoveToEscrow => "move_to_escrow",
            PaymentEvent::ServiceDelivered { .. } => "service_delivered",
            PaymentEvent::ReleaseToConsultant => "release_to_consultant",
            PaymentEvent::OpenDispute { .. } => "open_dispute",
            PaymentEvent::ResolveDispute { .. } => "resolve_dispute",
            PaymentEvent::Refund { .. } => "refund",
            PaymentEvent::Fail { .. } => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Transitioned,
    /// Idempotent re-delivery of an already applied event; state untouched.
    Unchanged,
}

/// The single transition table for a payment intent. Takes the intent by
/// value and either returns the fully transitioned copy or an error with
/// the caller's copy untouched, so a transition can never half-apply.
pub fn apply(
    mut intent: PaymentIntent,
    event: &PaymentEvent,
    now: DateTime<Utc>,
) -> Result<(PaymentIntent, Applied), EscrowError> {
    use PaymentIntentStatus::*;

    let applied = match (intent.status, event) {
        (Pending, PaymentEvent::MarkPaid { gateway_reference_id }) => {
            match &intent.gateway_reference_id {
                Some(existing) if existing != gateway_reference_id => {
                    return Err(invalid(&intent, event, "gateway reference mismatch"));
                }
                _ => {}
            }
            intent.gateway_reference_id = Some(gateway_reference_id.clone());
            intent.status = Paid;
            intent.paid_at = Some(now);
            Applied::Transitioned
        }
        (
            Paid | HeldInEscrow | ServiceDelivered | ReleasedToConsultant | Disputed,
            PaymentEvent::MarkPaid { gateway_reference_id },
        ) if intent.gateway_reference_id.as_deref() == Some(gateway_reference_id.as_str()) => {
            Applied::Unchanged
        }

        (Paid, PaymentEvent::MoveToEscrow) => {
            intent.status = HeldInEscrow;
            Applied::Transitioned
        }
        (HeldInEscrow, PaymentEvent::MoveToEscrow) => Applied::Unchanged,

        (HeldInEscrow, PaymentEvent::ServiceDelivered { release_due_at, .. }) => {
            intent.status = ServiceDelivered;
            intent.service_delivered_at = Some(now);
            intent.escrow_release_due_at = Some(*release_due_at);
            Applied::Transitioned
        }
        (ServiceDelivered, PaymentEvent::ServiceDelivered { .. }) => Applied::Unchanged,

        (ServiceDelivered, PaymentEvent::ReleaseToConsultant) => {
            let due_at = intent
                .escrow_release_due_at
                .ok_or_else(|| invalid(&intent, event, "missing escrow due timestamp"))?;
            if now < due_at {
                return Err(EscrowError::EscrowNotDue { due_at });
            }
            intent.status = ReleasedToConsultant;
            intent.payout_released_at = Some(now);
            Applied::Transitioned
        }
        (ReleasedToConsultant, PaymentEvent::ReleaseToConsultant) => Applied::Unchanged,

        (
            HeldInEscrow | ServiceDelivered | ReleasedToConsultant,
            PaymentEvent::OpenDispute { reason },
        ) => {
            intent.disputed_from = Some(intent.status);
            intent.dispute_reason = Some(reason.clone());
            intent.status = Disputed;
            Applied::Transitioned
        }
        (Disputed, PaymentEvent::OpenDispute { .. }) => Applied::Unchanged,

        (Disputed, PaymentEvent::ResolveDispute { outcome }) => match outcome {
            DisputeOutcome::UpheldForCustomer => {
                intent.refunded_minor = intent.gross_amount_minor;
                intent.status = Refunded;
                intent.disputed_from = None;
                Applied::Transitioned
            }
            DisputeOutcome::Dismissed => {
                let restored = intent
                    .disputed_from
                    .take()
                    .ok_or_else(|| invalid(&intent, event, "no recorded pre-dispute status"))?;
                intent.status = restored;
                Applied::Transitioned
            }
        },

        (Paid | HeldInEscrow | Disputed, PaymentEvent::Refund { amount_minor, .. }) => {
            if *amount_minor <= 0 {
                return Err(EscrowError::AmountInvalid(format!(
                    "refund amount must be positive, got {amount_minor}"
                )));
            }
            if *amount_minor > intent.refundable_minor() {
                return Err(EscrowError::AmountInvalid(format!(
                    "refund of {amount_minor} exceeds remaining refundable {}",
                    intent.refundable_minor()
                )));
            }
            intent.refunded_minor += amount_minor;
            if intent.refunded_minor == intent.gross_amount_minor {
                intent.status = Refunded;
                intent.disputed_from = None;
            }
            Applied::Transitioned
        }

        (Pending, PaymentEvent::Fail { reason }) => {
            intent.status = Failed;
            intent.failure_reason = Some(reason.clone());
            Applied::Transitioned
        }
        (Failed, PaymentEvent::Fail { .. }) => Applied::Unchanged,

        _ => return Err(invalid(&intent, event, "not a valid source state")),
    };

    Ok((intent, applied))
}

fn invalid(intent: &PaymentIntent, event: &PaymentEvent, detail: &str) -> EscrowError {
    EscrowError::InvalidTransition(format!(
        "{} in {:?}: {detail}",
        event.name(),
        intent.status
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn intent(status: PaymentIntentStatus) -> PaymentIntent {
        PaymentIntent {
            id: Uuid::new_v4(),
            booking_id: "bk_1".to_string(),
            consultant_id: "con_1".to_string(),
            customer_identity: "alice@example.com".to_string(),
            gross_amount_minor: 3000,
            currency: "EUR".to_string(),
            platform_fee_minor: 450,
            consultant_amount_minor: 2550,
            refunded_minor: 0,
            status,
            disputed_from: None,
            dispute_reason: None,
            failure_reason: None,
            gateway_reference_id: Some("ch_1".to_string()),
            manual_attention: false,
            created_at: Utc::now(),
            paid_at: None,
            service_delivered_at: None,
            payout_released_at: None,
            escrow_release_due_at: None,
        }
    }

    #[test]
    fn happy_path_reaches_release() {
        let now = Utc::now();
        let i = intent(PaymentIntentStatus::Pending);
        let (i, _) = apply(
            i,
            &PaymentEvent::MarkPaid {
                gateway_reference_id: "ch_1".to_string(),
            },
            now,
        )
        .unwrap();
        let (i, _) = apply(i, &PaymentEvent::MoveToEscrow, now).unwrap();
        let (i, _) = apply(
            i,
            &PaymentEvent::ServiceDelivered {
                delivered_by: "con_1".to_string(),
                confirmation: None,
                release_due_at: now,
            },
            now,
        )
        .unwrap();
        let (i, applied) = apply(i, &PaymentEvent::ReleaseToConsultant, now).unwrap();
        assert_eq!(applied, Applied::Transitioned);
        assert_eq!(i.status, PaymentIntentStatus::ReleasedToConsultant);
        assert!(i.balanced());
    }

    #[test]
    fn skip_state_is_rejected() {
        let err = apply(
            intent(PaymentIntentStatus::Pending),
            &PaymentEvent::ReleaseToConsultant,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidTransition(_)));
    }

    #[test]
    fn duplicate_mark_paid_same_reference_is_noop() {
        let now = Utc::now();
        let event = PaymentEvent::MarkPaid {
            gateway_reference_id: "ch_1".to_string(),
        };
        let (i, _) = apply(intent(PaymentIntentStatus::Pending), &event, now).unwrap();
        let (i, applied) = apply(i, &event, now).unwrap();
        assert_eq!(applied, Applied::Unchanged);
        assert_eq!(i.status, PaymentIntentStatus::Paid);
    }

    #[test]
    fn mark_paid_with_different_reference_fails() {
        let now = Utc::now();
        let (i, _) = apply(
            intent(PaymentIntentStatus::Pending),
            &PaymentEvent::MarkPaid {
                gateway_reference_id: "ch_1".to_string(),
            },
            now,
        )
        .unwrap();
        let err = apply(
            i,
            &PaymentEvent::MarkPaid {
                gateway_reference_id: "ch_other".to_string(),
            },
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidTransition(_)));
    }

    #[test]
    fn release_before_due_fails_without_mutation() {
        let now = Utc::now();
        let mut i = intent(PaymentIntentStatus::ServiceDelivered);
        i.escrow_release_due_at = Some(now + chrono::Duration::hours(23));
        let err = apply(i.clone(), &PaymentEvent::ReleaseToConsultant, now).unwrap_err();
        assert!(matches!(err, EscrowError::EscrowNotDue { .. }));
        assert_eq!(i.status, PaymentIntentStatus::ServiceDelivered);
    }

    #[test]
    fn partial_refund_keeps_status_and_caps_total() {
        let now = Utc::now();
        let i = intent(PaymentIntentStatus::HeldInEscrow);
        let (i, _) = apply(
            i,
            &PaymentEvent::Refund {
                amount_minor: 1000,
                reason: "goodwill".to_string(),
            },
            now,
        )
        .unwrap();
        assert_eq!(i.status, PaymentIntentStatus::HeldInEscrow);
        assert_eq!(i.refunded_minor, 1000);

        let err = apply(
            i.clone(),
            &PaymentEvent::Refund {
                amount_minor: 2500,
                reason: "too much".to_string(),
            },
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EscrowError::AmountInvalid(_)));

        let (i, _) = apply(
            i,
            &PaymentEvent::Refund {
                amount_minor: 2000,
                reason: "remainder".to_string(),
            },
            now,
        )
        .unwrap();
        assert_eq!(i.status, PaymentIntentStatus::Refunded);
    }

    #[test]
    fn paid_intent_cannot_fail() {
        let err = apply(
            intent(PaymentIntentStatus::Paid),
            &PaymentEvent::Fail {
                reason: "cancelled".to_string(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidTransition(_)));
    }

    #[test]
    fn dispute_freezes_release() {
        let now = Utc::now();
        let mut i = intent(PaymentIntentStatus::ServiceDelivered);
        i.escrow_release_due_at = Some(now - chrono::Duration::hours(1));
        let (i, _) = apply(
            i,
            &PaymentEvent::OpenDispute {
                reason: "no-show".to_string(),
            },
            now,
        )
        .unwrap();
        assert_eq!(i.status, PaymentIntentStatus::Disputed);
        let err = apply(i, &PaymentEvent::ReleaseToConsultant, now).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidTransition(_)));
    }

    #[test]
    fn dismissed_dispute_restores_prior_status() {
        let now = Utc::now();
        let i = intent(PaymentIntentStatus::HeldInEscrow);
        let (i, _) = apply(
            i,
            &PaymentEvent::OpenDispute {
                reason: "quality".to_string(),
            },
            now,
        )
        .unwrap();
        let (i, _) = apply(
            i,
            &PaymentEvent::ResolveDispute {
                outcome: DisputeOutcome::Dismissed,
            },
            now,
        )
        .unwrap();
        assert_eq!(i.status, PaymentIntentStatus::HeldInEscrow);
        assert!(i.disputed_from.is_none());
    }

    #[test]
    fn upheld_dispute_refunds_in_full() {
        let now = Utc::now();
        let i = intent(PaymentIntentStatus::HeldInEscrow);
        let (i, _) = apply(
            i,
            &PaymentEvent::OpenDispute {
                reason: "no-show".to_string(),
            },
            now,
        )
        .unwrap();
        let (i, _) = apply(
            i,
            &PaymentEvent::ResolveDispute {
                outcome: DisputeOutcome::UpheldForCustomer,
            },
            now,
        )
        .unwrap();
        assert_eq!(i.status, PaymentIntentStatus::Refunded);
        assert_eq!(i.refunded_minor, i.gross_amount_minor);
    }
}
