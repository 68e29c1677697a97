use crate::error::EscrowError;
use crate::service::payment_service::PaymentService;
use crate::store::escrow_queue::{EscrowQueue, EscrowScheduleEntry};
use chrono::{Duration, Utc};

/// Periodic worker that drives `SERVICE_DELIVERED -> RELEASED_TO_CONSULTANT`
/// once the hold period elapses. Entries are claimed with a lease, so a
/// second scheduler instance polling the same queue cannot double-release.
#[derive(Clone)]
pub struct EscrowScheduler {
    pub queue: EscrowQueue,
    pub service: PaymentService,
    pub poll_interval: std::time::Duration,
    pub lease: Duration,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub backoff_cap_seconds: i64,
    pub kyc_recheck: Duration,
    pub max_ineligible_wait: Duration,
}

impl EscrowScheduler {
    pub fn from_config(
        config: &crate::config::AppConfig,
        queue: EscrowQueue,
        service: PaymentService,
    ) -> Self {
        Self {
            queue,
            service,
            poll_interval: std::time::Duration::from_secs(config.scheduler_poll_seconds),
            lease: Duration::seconds(config.scheduler_lease_seconds),
            batch_size: config.scheduler_batch_size,
            max_attempts: config.scheduler_max_attempts,
            backoff_cap_seconds: config.scheduler_backoff_cap_seconds,
            kyc_recheck: Duration::seconds(config.kyc_recheck_seconds),
            max_ineligible_wait: Duration::hours(config.max_ineligible_wait_hours),
        }
    }

    pub async fn run(self) {
        loop {
            if let Err(err) = self.tick().await {
                tracing::error!(error = %err, "escrow scheduler tick failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn tick(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let batch = self.queue.claim_due(now, self.lease, self.batch_size).await;
        for entry in batch {
            self.process_entry(entry).await;
        }
        Ok(())
    }

    async fn process_entry(&self, entry: EscrowScheduleEntry) {
        let intent_id = entry.payment_intent_id;
        let now = Utc::now();
        match self.service.release_to_consultant(intent_id).await {
            Ok(_) => {
                self.queue.complete(intent_id).await;
            }
            Err(EscrowError::EscrowNotDue { due_at }) => {
                self.queue.reschedule(intent_id, due_at, None, false).await;
            }
            Err(EscrowError::PayoutIneligible(consultant_id)) => {
                if now - entry.created_at >= self.max_ineligible_wait {
                    tracing::warn!(
                        %intent_id,
                        %consultant_id,
                        "consultant still ineligible after maximum wait, needs operator"
                    );
                    self.queue
                        .flag_manual_attention(intent_id, "payout-ineligible past maximum wait")
                        .await;
                    self.service.intents.flag_manual_attention(intent_id).await;
                } else {
                    self.queue
                        .reschedule(
                            intent_id,
                            now + self.kyc_recheck,
                            Some("consultant not payout-eligible".to_string()),
                            false,
                        )
                        .await;
                }
            }
            Err(EscrowError::InvalidTransition(detail)) => {
                // The intent moved on (dispute or refund); the entry is done.
                tracing::info!(%intent_id, detail, "escrow entry obsolete, dropping");
                self.queue.complete(intent_id).await;
            }
            Err(err) => {
                let attempts = entry.attempts + 1;
                if attempts >= self.max_attempts {
                    tracing::error!(
                        %intent_id,
                        attempts,
                        error = %err,
                        "escrow release retries exhausted, needs operator"
                    );
                    self.queue
                        .flag_manual_attention(intent_id, &err.to_string())
                        .await;
                    self.service.intents.flag_manual_attention(intent_id).await;
                } else {
                    let backoff = i64::min(
                        self.backoff_cap_seconds,
                        2_i64.pow(attempts.min(16)),
                    );
                    let jitter = (rand::random::<f64>() * 3.0) as i64;
                    self.queue
                        .reschedule(
                            intent_id,
                            now + Duration::seconds(backoff + jitter),
                            Some(err.to_string()),
                            true,
                        )
                        .await;
                    tracing::warn!(%intent_id, attempts, error = %err, "escrow release failed, retrying");
                }
            }
        }
    }
}
