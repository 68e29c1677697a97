use crate::fraud::types::RiskPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub settlement_currency: String,
    pub platform_fee_ratio: Decimal,
    pub escrow_hold_hours: i64,
    pub scheduler_poll_seconds: u64,
    pub scheduler_lease_seconds: i64,
    pub scheduler_batch_size: usize,
    pub scheduler_max_attempts: u32,
    pub scheduler_backoff_cap_seconds: i64,
    pub kyc_recheck_seconds: i64,
    pub max_ineligible_wait_hours: i64,
    pub external_call_timeout_ms: u64,
    pub rate_cache_ttl_seconds: i64,
    pub risk_policy: RiskPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut risk_policy = RiskPolicy::default();
        if let Some(v) = env_u32("RISK_BLOCK_THRESHOLD") {
            risk_policy.block_threshold = v;
        }
        if let Some(v) = env_u32("RISK_REVIEW_THRESHOLD") {
            risk_policy.review_threshold = v;
        }
        if let Some(v) = env_i64("RISK_DAILY_SPEND_CEILING_MINOR") {
            risk_policy.daily_spend_ceiling_minor = v;
        }
        if let Some(v) = env_u32("RISK_VELOCITY_MAX_ATTEMPTS") {
            risk_policy.velocity_max_attempts = v;
        }

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            settlement_currency: std::env::var("SETTLEMENT_CURRENCY").unwrap_or_else(|_| "EUR".to_string()),
            platform_fee_ratio: std::env::var("PLATFORM_FEE_RATIO")
                .ok()
                .and_then(|v| v.parse::<Decimal>().ok())
                .unwrap_or(dec!(0.15)),
            escrow_hold_hours: env_i64("ESCROW_HOLD_HOURS").unwrap_or(24),
            scheduler_poll_seconds: env_u64("SCHEDULER_POLL_SECONDS").unwrap_or(30),
            scheduler_lease_seconds: env_i64("SCHEDULER_LEASE_SECONDS").unwrap_or(60),
            scheduler_batch_size: env_u64("SCHEDULER_BATCH_SIZE").unwrap_or(50) as usize,
            scheduler_max_attempts: env_u32("SCHEDULER_MAX_ATTEMPTS").unwrap_or(8),
            scheduler_backoff_cap_seconds: env_i64("SCHEDULER_BACKOFF_CAP_SECONDS").unwrap_or(300),
            kyc_recheck_seconds: env_i64("KYC_RECHECK_SECONDS").unwrap_or(3600),
            max_ineligible_wait_hours: env_i64("MAX_INELIGIBLE_WAIT_HOURS").unwrap_or(720),
            external_call_timeout_ms: env_u64("EXTERNAL_CALL_TIMEOUT_MS").unwrap_or(400),
            rate_cache_ttl_seconds: env_i64("RATE_CACHE_TTL_SECONDS").unwrap_or(300),
            risk_policy,
        }
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
