use crate::domain::payment::PaymentIntent;
use crate::error::EscrowError;
use crate::lifecycle::machine::{self, Applied, PaymentEvent};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    intents: HashMap<Uuid, PaymentIntent>,
    by_gateway_ref: HashMap<String, Uuid>,
}

/// Authoritative store of payment intents. Transitions run as a single
/// read-modify-write under the write lock, so two transitions on the same
/// intent can never interleave: whichever commits second sees the first
/// one's state and is judged against it.
#[derive(Clone, Default)]
pub struct IntentStore {
    inner: Arc<RwLock<Inner>>,
}

impl IntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, intent: PaymentIntent) {
        let mut inner = self.inner.write().await;
        if let Some(reference) = &intent.gateway_reference_id {
            inner.by_gateway_ref.insert(reference.clone(), intent.id);
        }
        inner.intents.insert(intent.id, intent);
    }

    pub async fn get(&self, id: Uuid) -> Option<PaymentIntent> {
        let inner = self.inner.read().await;
        inner.intents.get(&id).cloned()
    }

    pub async fn find_by_gateway_reference(&self, reference: &str) -> Option<PaymentIntent> {
        let inner = self.inner.read().await;
        let id = inner.by_gateway_ref.get(reference)?;
        inner.intents.get(id).cloned()
    }

    pub async fn record_gateway_reference(
        &self,
        id: Uuid,
        reference: &str,
    ) -> Result<(), EscrowError> {
        let mut inner = self.inner.write().await;
        let intent = inner.intents.get_mut(&id).ok_or(EscrowError::NotFound)?;
        intent.gateway_reference_id = Some(reference.to_string());
        inner.by_gateway_ref.insert(reference.to_string(), id);
        Ok(())
    }

    pub async fn apply(
        &self,
        id: Uuid,
        event: &PaymentEvent,
        now: DateTime<Utc>,
    ) -> Result<(PaymentIntent, Applied), EscrowError> {
        let mut inner = self.inner.write().await;
        let current = inner.intents.get(&id).ok_or(EscrowError::NotFound)?.clone();
        let (next, applied) = machine::apply(current, event, now)?;
        if let Some(reference) = &next.gateway_reference_id {
            inner.by_gateway_ref.insert(reference.clone(), id);
        }
        inner.intents.insert(id, next.clone());
        Ok((next, applied))
    }

    pub async fn flag_manual_attention(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(intent) = inner.intents.get_mut(&id) {
            intent.manual_attention = true;
        }
    }

    pub async fn clear_manual_attention(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(intent) = inner.intents.get_mut(&id) {
            intent.manual_attention = false;
        }
    }

    pub async fn list_manual_attention(&self) -> Vec<PaymentIntent> {
        let inner = self.inner.read().await;
        inner
            .intents
            .values()
            .filter(|i| i.manual_attention)
            .cloned()
            .collect()
    }
}
