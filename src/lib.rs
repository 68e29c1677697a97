pub mod config;
pub mod domain {
    pub mod fraud;
    pub mod payment;
}
pub mod error;
pub mod fees;
pub mod fraud {
    pub mod engine;
    pub mod history;
    pub mod types;
}
pub mod fx;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod webhooks;
    }
}
pub mod lifecycle {
    pub mod machine;
}
pub mod service {
    pub mod escrow_scheduler;
    pub mod payment_service;
    pub mod webhook_reconciler;
}
pub mod store {
    pub mod assessments;
    pub mod escrow_queue;
    pub mod intents;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub reconciler: service::webhook_reconciler::WebhookReconciler,
    pub escrow_queue: store::escrow_queue::EscrowQueue,
}
