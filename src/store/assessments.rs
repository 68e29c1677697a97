use crate::domain::fraud::FraudAssessment;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only assessment log. The one permitted mutation is binding the
/// intent id after the intent is created, since assessment runs first.
#[derive(Clone, Default)]
pub struct AssessmentStore {
    inner: Arc<RwLock<Vec<FraudAssessment>>>,
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, assessment: FraudAssessment) {
        let mut inner = self.inner.write().await;
        inner.push(assessment);
    }

    pub async fn bind_intent(&self, assessment_id: Uuid, intent_id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(assessment) = inner.iter_mut().find(|a| a.id == assessment_id) {
            assessment.payment_intent_id = Some(intent_id);
        }
    }

    pub async fn for_intent(&self, intent_id: Uuid) -> Option<FraudAssessment> {
        let inner = self.inner.read().await;
        inner
            .iter()
            .rev()
            .find(|a| a.payment_intent_id == Some(intent_id))
            .cloned()
    }

    pub async fn for_identity(&self, identity: &str) -> Vec<FraudAssessment> {
        let inner = self.inner.read().await;
        inner
            .iter()
            .filter(|a| a.customer_identity == identity)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.len()
    }
}
