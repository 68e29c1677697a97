use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct EscrowScheduleEntry {
    pub payment_intent_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub claimed_until: Option<DateTime<Utc>>,
    pub manual_attention: bool,
    pub created_at: DateTime<Utc>,
}

/// Due-entry queue for escrow release. `claim_due` takes a lease on each
/// returned entry under the write lock, so two scheduler workers can never
/// hold the same entry at once; a crashed worker's lease simply expires.
#[derive(Clone, Default)]
pub struct EscrowQueue {
    inner: Arc<RwLock<HashMap<Uuid, EscrowScheduleEntry>>>,
}

impl EscrowQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: re-recording delivery for an already scheduled intent
    /// keeps the existing entry and its attempt count.
    pub async fn schedule(&self, payment_intent_id: Uuid, due_at: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        inner
            .entry(payment_intent_id)
            .or_insert_with(|| EscrowScheduleEntry {
                payment_intent_id,
                due_at,
                attempts: 0,
                last_error: None,
                claimed_until: None,
                manual_attention: false,
                created_at: Utc::now(),
            });
    }

    pub async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: usize,
    ) -> Vec<EscrowScheduleEntry> {
        let mut inner = self.inner.write().await;
        let mut claimed = Vec::new();
        for entry in inner.values_mut() {
            if claimed.len() >= limit {
                break;
            }
            if entry.manual_attention || entry.due_at > now {
                continue;
            }
            if entry.claimed_until.is_some_and(|until| until > now) {
                continue;
            }
            entry.claimed_until = Some(now + lease);
            claimed.push(entry.clone());
        }
        claimed
    }

    pub async fn complete(&self, payment_intent_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.remove(&payment_intent_id);
    }

    pub async fn reschedule(
        &self,
        payment_intent_id: Uuid,
        due_at: DateTime<Utc>,
        last_error: Option<String>,
        bump_attempts: bool,
    ) {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.get_mut(&payment_intent_id) {
            entry.due_at = due_at;
            entry.claimed_until = None;
            if last_error.is_some() {
                entry.last_error = last_error;
            }
            if bump_attempts {
                entry.attempts += 1;
            }
        }
    }

    pub async fn flag_manual_attention(&self, payment_intent_id: Uuid, reason: &str) {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.get_mut(&payment_intent_id) {
            entry.manual_attention = true;
            entry.claimed_until = None;
            entry.last_error = Some(reason.to_string());
        }
    }

    pub async fn list_manual_attention(&self) -> Vec<EscrowScheduleEntry> {
        let inner = self.inner.read().await;
        inner
            .values()
            .filter(|e| e.manual_attention)
            .cloned()
            .collect()
    }

    pub async fn get(&self, payment_intent_id: Uuid) -> Option<EscrowScheduleEntry> {
        let inner = self.inner.read().await;
        inner.get(&payment_intent_id).cloned()
    }
}
