use crate::error::EscrowError;
use crate::gateways::RateProvider;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
struct CacheEntry {
    rate: Decimal,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateQuote {
    pub rate: Decimal,
    pub stale: bool,
}

/// TTL cache over the rate provider. Concurrent callers for the same pair
/// share one in-flight fetch: the per-pair gate serializes refreshes and the
/// cache is re-checked after the gate is acquired. An expired entry is served
/// with `stale = true` when the provider is down; a cold pair with a failing
/// provider is `RateUnavailable`.
#[derive(Clone)]
pub struct RateCache {
    entries: Arc<RwLock<HashMap<(String, String), CacheEntry>>>,
    inflight: Arc<Mutex<HashMap<(String, String), Arc<Mutex<()>>>>>,
    ttl: chrono::Duration,
    provider_timeout: std::time::Duration,
}

impl RateCache {
    pub fn new(ttl_seconds: i64, provider_timeout: std::time::Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            ttl: chrono::Duration::seconds(ttl_seconds),
            provider_timeout,
        }
    }

    pub async fn rate(
        &self,
        from: &str,
        to: &str,
        provider: &dyn RateProvider,
    ) -> Result<RateQuote, EscrowError> {
        let key = (from.to_string(), to.to_string());
        let now = Utc::now();

        if let Some(quote) = self.fresh(&key, now).await {
            return Ok(quote);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _fetching = gate.lock().await;

        // Another caller may have refreshed the pair while we waited.
        if let Some(quote) = self.fresh(&key, Utc::now()).await {
            return Ok(quote);
        }

        let fetched = tokio::time::timeout(self.provider_timeout, provider.spot_rate(from, to)).await;
        match fetched {
            Ok(Ok(rate)) => {
                let mut entries = self.entries.write().await;
                entries.insert(
                    key,
                    CacheEntry {
                        rate,
                        fetched_at: Utc::now(),
                    },
                );
                Ok(RateQuote { rate, stale: false })
            }
            Ok(Err(err)) => self.stale_fallback(&key, &err.to_string()).await,
            Err(_) => self.stale_fallback(&key, "provider timed out").await,
        }
    }

    async fn fresh(&self, key: &(String, String), now: DateTime<Utc>) -> Option<RateQuote> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| {
            if now - entry.fetched_at <= self.ttl {
                Some(RateQuote {
                    rate: entry.rate,
                    stale: false,
                })
            } else {
                None
            }
        })
    }

    async fn stale_fallback(
        &self,
        key: &(String, String),
        reason: &str,
    ) -> Result<RateQuote, EscrowError> {
        let entries = self.entries.read().await;
        if let Some(entry) = entries.get(key) {
            tracing::warn!(
                pair = %format!("{}->{}", key.0, key.1),
                reason,
                "serving expired exchange rate"
            );
            return Ok(RateQuote {
                rate: entry.rate,
                stale: true,
            });
        }
        Err(EscrowError::RateUnavailable {
            from: key.0.clone(),
            to: key.1.clone(),
        })
    }
}
