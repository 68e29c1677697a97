use chrono::Utc;
use escrow_engine::domain::payment::{PaymentIntent, PaymentIntentStatus};
use escrow_engine::gateways::{GatewayEvent, GatewayEventType};
use escrow_engine::service::webhook_reconciler::{ReconcileOutcome, WebhookReconciler};
use escrow_engine::store::intents::IntentStore;
use uuid::Uuid;

#[tokio::test]
async fn charge_succeeded_moves_to_escrow_and_duplicates_are_noops() {
    let (reconciler, store) = reconciler().await;
    let intent = seeded(&store, "ch_1").await;

    let outcome = reconciler.process(event(GatewayEventType::ChargeSucceeded, "ch_1")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert_eq!(
        store.get(intent.id).await.unwrap().status,
        PaymentIntentStatus::HeldInEscrow
    );

    let outcome = reconciler.process(event(GatewayEventType::ChargeSucceeded, "ch_1")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Duplicate);
    assert_eq!(
        store.get(intent.id).await.unwrap().status,
        PaymentIntentStatus::HeldInEscrow
    );
}

#[tokio::test]
async fn unknown_reference_is_logged_and_discarded() {
    let (reconciler, _store) = reconciler().await;
    let outcome = reconciler
        .process(event(GatewayEventType::ChargeSucceeded, "ch_unknown"))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Discarded);
    assert_eq!(reconciler.discarded_count(), 1);
}

#[tokio::test]
async fn out_of_order_failure_after_success_is_discarded() {
    let (reconciler, store) = reconciler().await;
    let intent = seeded(&store, "ch_1").await;

    reconciler
        .process(event(GatewayEventType::ChargeSucceeded, "ch_1"))
        .await
        .unwrap();
    let outcome = reconciler
        .process(event(GatewayEventType::ChargeFailed, "ch_1"))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Discarded);
    assert_eq!(
        store.get(intent.id).await.unwrap().status,
        PaymentIntentStatus::HeldInEscrow
    );
}

#[tokio::test]
async fn dispute_and_refund_events_apply() {
    let (reconciler, store) = reconciler().await;
    let intent = seeded(&store, "ch_1").await;

    reconciler
        .process(event(GatewayEventType::ChargeSucceeded, "ch_1"))
        .await
        .unwrap();
    let outcome = reconciler
        .process(GatewayEvent {
            event_type: GatewayEventType::DisputeOpened,
            gateway_reference_id: "ch_1".to_string(),
            payload: serde_json::json!({ "reason": "customer claims no-show" }),
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied);
    let current = store.get(intent.id).await.unwrap();
    assert_eq!(current.status, PaymentIntentStatus::Disputed);
    assert_eq!(
        current.dispute_reason.as_deref(),
        Some("customer claims no-show")
    );

    let outcome = reconciler
        .process(GatewayEvent {
            event_type: GatewayEventType::RefundCompleted,
            gateway_reference_id: "ch_1".to_string(),
            payload: serde_json::json!({ "amount_minor": 3000 }),
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert_eq!(
        store.get(intent.id).await.unwrap().status,
        PaymentIntentStatus::Refunded
    );

    // A redelivered refund event finds nothing left to refund.
    let outcome = reconciler
        .process(GatewayEvent {
            event_type: GatewayEventType::RefundCompleted,
            gateway_reference_id: "ch_1".to_string(),
            payload: serde_json::json!({ "amount_minor": 3000 }),
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Discarded);
}

fn event(event_type: GatewayEventType, reference: &str) -> GatewayEvent {
    GatewayEvent {
        event_type,
        gateway_reference_id: reference.to_string(),
        payload: serde_json::Value::Null,
    }
}

async fn reconciler() -> (WebhookReconciler, IntentStore) {
    let store = IntentStore::new();
    (WebhookReconciler::new(store.clone()), store)
}

async fn seeded(store: &IntentStore, reference: &str) -> PaymentIntent {
    let intent = PaymentIntent {
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
        gateway_reference_id: Some(reference.to_string()),
        manual_attention: false,
        created_at: Utc::now(),
        paid_at: None,
        service_delivered_at: None,
        payout_released_at: None,
        escrow_release_due_at: None,
    };
    store.insert(intent.clone()).await;
    intent
}
