use chrono::{Duration, Utc};
use escrow_engine::domain::payment::{PaymentIntent, PaymentIntentStatus};
use escrow_engine::error::EscrowError;
use escrow_engine::lifecycle::machine::{apply, Applied, PaymentEvent};
use escrow_engine::store::intents::IntentStore;
use uuid::Uuid;

#[test]
fn release_timing_gate() {
    let delivered_at = Utc::now();
    let mut intent = pending_intent();
    intent.status = PaymentIntentStatus::ServiceDelivered;
    intent.escrow_release_due_at = Some(delivered_at + Duration::hours(24));

    // One hour in: too early.
    let err = apply(
        intent.clone(),
        &PaymentEvent::ReleaseToConsultant,
        delivered_at + Duration::hours(1),
    )
    .unwrap_err();
    assert!(matches!(err, EscrowError::EscrowNotDue { .. }));

    // Twenty-five hours in: releases.
    let (released, applied) = apply(
        intent,
        &PaymentEvent::ReleaseToConsultant,
        delivered_at + Duration::hours(25),
    )
    .unwrap();
    assert_eq!(applied, Applied::Transitioned);
    assert_eq!(released.status, PaymentIntentStatus::ReleasedToConsultant);
}

#[tokio::test]
async fn store_rejects_skip_state_without_mutation() {
    let store = IntentStore::new();
    let intent = pending_intent();
    let id = intent.id;
    store.insert(intent).await;

    let err = store
        .apply(id, &PaymentEvent::ReleaseToConsultant, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EscrowError::InvalidTransition(_)));
    assert_eq!(
        store.get(id).await.unwrap().status,
        PaymentIntentStatus::Pending
    );
}

#[tokio::test]
async fn cancellation_and_webhook_race_has_single_winner() {
    let store = IntentStore::new();
    let intent = pending_intent();
    let id = intent.id;
    store.insert(intent).await;

    let cancel = PaymentEvent::Fail {
        reason: "booking cancelled".to_string(),
    };
    let paid = PaymentEvent::MarkPaid {
        gateway_reference_id: "ch_1".to_string(),
    };

    let (a, b) = tokio::join!(
        store.apply(id, &cancel, Utc::now()),
        store.apply(id, &paid, Utc::now()),
    );

    // Exactly one of the two transitions wins; the loser is rejected and
    // the winner's state is what remains.
    assert!(a.is_ok() != b.is_ok());
    let status = store.get(id).await.unwrap().status;
    assert!(
        status == PaymentIntentStatus::Failed || status == PaymentIntentStatus::Paid,
        "unexpected status {status:?}"
    );
}

#[tokio::test]
async fn balance_invariant_holds_across_lifecycle() {
    let store = IntentStore::new();
    let intent = pending_intent();
    let id = intent.id;
    store.insert(intent).await;

    let now = Utc::now();
    let steps = vec![
        PaymentEvent::MarkPaid {
            gateway_reference_id: "ch_1".to_string(),
        },
        PaymentEvent::MoveToEscrow,
        PaymentEvent::ServiceDelivered {
            delivered_by: "con_1".to_string(),
            confirmation: Some("both parties confirmed".to_string()),
            release_due_at: now,
        },
        PaymentEvent::ReleaseToConsultant,
    ];
    for event in &steps {
        let (intent, _) = store.apply(id, event, now).await.unwrap();
        assert!(intent.balanced(), "unbalanced after {}", event.name());
    }
}

fn pending_intent() -> PaymentIntent {
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
        status: PaymentIntentStatus::Pending,
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
