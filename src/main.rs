use axum::routing::{get, post};
use axum::Router;
use escrow_engine::config::AppConfig;
use escrow_engine::fraud::engine::FraudEngine;
use escrow_engine::fraud::history::AttemptHistory;
use escrow_engine::fx::CurrencyConverter;
use escrow_engine::gateways::mock::{MockGateway, MockIpReputation, MockKyc, StaticRateProvider};
use escrow_engine::http::handlers::{ops, payments, webhooks};
use escrow_engine::service::escrow_scheduler::EscrowScheduler;
use escrow_engine::service::payment_service::PaymentService;
use escrow_engine::service::webhook_reconciler::WebhookReconciler;
use escrow_engine::store::assessments::AssessmentStore;
use escrow_engine::store::escrow_queue::EscrowQueue;
use escrow_engine::store::intents::IntentStore;
use escrow_engine::AppState;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let intents = IntentStore::new();
    let assessments = AssessmentStore::new();
    let escrow_queue = EscrowQueue::new();

    // Mock collaborators stand in for the real gateway/KYC/rate/reputation
    // integrations until their adapters are wired in deployment config.
    let gateway = Arc::new(MockGateway::new("ALWAYS_SUCCESS"));
    let kyc = Arc::new(MockKyc::eligible());
    let rates = Arc::new(StaticRateProvider::new(vec![
        ("USD", "EUR", dec!(0.92)),
        ("GBP", "EUR", dec!(1.17)),
        ("EUR", "USD", dec!(1.09)),
    ]));
    let reputation = Arc::new(MockIpReputation {
        score: 0,
        fail: false,
    });

    let converter = CurrencyConverter::new(
        rates,
        cfg.rate_cache_ttl_seconds,
        std::time::Duration::from_millis(cfg.external_call_timeout_ms),
    );
    let fraud = Arc::new(FraudEngine {
        policy: cfg.risk_policy.clone(),
        history: AttemptHistory::new(),
        reputation,
        assessments: assessments.clone(),
    });

    let payment_service = PaymentService {
        config: cfg.clone(),
        intents: intents.clone(),
        assessments,
        escrow_queue: escrow_queue.clone(),
        fraud,
        converter,
        gateway,
        kyc,
    };

    let scheduler = EscrowScheduler::from_config(&cfg, escrow_queue.clone(), payment_service.clone());
    tokio::spawn(scheduler.run());

    let reconciler = WebhookReconciler::new(intents);
    let state = AppState {
        payment_service,
        reconciler,
        escrow_queue,
    };

    let app = Router::new()
        .route("/health", get(payments::health))
        .route("/ops/liveness", get(ops::liveness))
        .route("/ops/attention", get(ops::attention))
        .route("/payments/intents", post(payments::create_intent))
        .route("/payments/intents/:id", get(payments::get_status))
        .route(
            "/payments/intents/:id/assessment",
            get(payments::get_assessment),
        )
        .route(
            "/payments/intents/:id/delivered",
            post(payments::mark_service_delivered),
        )
        .route("/payments/intents/:id/refund", post(payments::refund))
        .route("/payments/intents/:id/cancel", post(payments::cancel))
        .route(
            "/payments/intents/:id/dispute/resolve",
            post(payments::resolve_dispute),
        )
        .route("/webhooks/gateway", post(webhooks::gateway_event))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "escrow engine listening");
    axum::serve(listener, app).await?;
    Ok(())
}
