use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub amount_minor: i64,
    pub at: DateTime<Utc>,
    pub method_fingerprint: Option<String>,
}

const RETENTION_DAYS: i64 = 30;

/// Per-identity attempt history backing the local fraud signals (spend,
/// velocity, amount statistics, known payment-method fingerprints).
#[derive(Clone, Default)]
pub struct AttemptHistory {
    inner: Arc<RwLock<HashMap<String, Vec<AttemptRecord>>>>,
}

impl AttemptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, identity: &str, record: AttemptRecord) {
        let cutoff = record.at - Duration::days(RETENTION_DAYS);
        let mut inner = self.inner.write().await;
        let records = inner.entry(identity.to_string()).or_default();
        records.retain(|r| r.at >= cutoff);
        records.push(record);
    }

    pub async fn daily_spend_minor(&self, identity: &str, now: DateTime<Utc>) -> i64 {
        let today = now.date_naive();
        let inner = self.inner.read().await;
        inner
            .get(identity)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.at.date_naive() == today)
                    .map(|r| r.amount_minor)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub async fn attempts_within(
        &self,
        identity: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> u32 {
        let cutoff = now - window;
        let inner = self.inner.read().await;
        inner
            .get(identity)
            .map(|records| records.iter().filter(|r| r.at >= cutoff).count() as u32)
            .unwrap_or(0)
    }

    /// Mean of prior attempt amounts, with the sample size.
    pub async fn amount_mean(&self, identity: &str) -> Option<(usize, Decimal)> {
        let inner = self.inner.read().await;
        let records = inner.get(identity)?;
        if records.is_empty() {
            return None;
        }
        let sum: i64 = records.iter().map(|r| r.amount_minor).sum();
        Some((
            records.len(),
            Decimal::from(sum) / Decimal::from(records.len() as i64),
        ))
    }

    pub async fn known_fingerprints(&self, identity: &str) -> HashSet<String> {
        let inner = self.inner.read().await;
        inner
            .get(identity)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.method_fingerprint.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
