use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Scoring policy: every signal weight and both action thresholds live here
/// rather than in the engine's control flow, so policy can change without
/// touching scoring logic.
#[derive(Debug, Clone)]
pub struct RiskPolicy {
    pub daily_spend_ceiling_minor: i64,
    pub daily_spend_points: u32,
    pub velocity_max_attempts: u32,
    pub velocity_window: chrono::Duration,
    pub velocity_points: u32,
    pub ip_reputation_max_points: u32,
    pub amount_outlier_multiplier: Decimal,
    pub amount_outlier_min_history: usize,
    pub amount_outlier_points: u32,
    pub method_mismatch_max_points: u32,
    pub review_threshold: u32,
    pub block_threshold: u32,
    pub signal_timeout: std::time::Duration,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            daily_spend_ceiling_minor: 500_000,
            daily_spend_points: 30,
            velocity_max_attempts: 5,
            velocity_window: chrono::Duration::minutes(10),
            velocity_points: 40,
            ip_reputation_max_points: 30,
            amount_outlier_multiplier: dec!(4),
            amount_outlier_min_history: 3,
            amount_outlier_points: 20,
            method_mismatch_max_points: 25,
            review_threshold: 40,
            block_threshold: 70,
            signal_timeout: std::time::Duration::from_millis(300),
        }
    }
}

pub mod factors {
    pub const DAILY_SPEND_CEILING: &str = "daily_spend_ceiling";
    pub const VELOCITY: &str = "velocity";
    pub const IP_REPUTATION: &str = "ip_reputation";
    pub const AMOUNT_OUTLIER: &str = "amount_outlier";
    pub const METHOD_MISMATCH: &str = "method_fingerprint_mismatch";
    pub const ASSESSMENT_ERROR: &str = "assessment_error";
}
