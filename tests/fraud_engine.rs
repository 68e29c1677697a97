use chrono::{Duration, Utc};
use escrow_engine::domain::fraud::{FraudAction, PaymentAttempt};
use escrow_engine::fraud::engine::FraudEngine;
use escrow_engine::fraud::history::{AttemptHistory, AttemptRecord};
use escrow_engine::fraud::types::RiskPolicy;
use escrow_engine::gateways::mock::MockIpReputation;
use escrow_engine::store::assessments::AssessmentStore;
use std::sync::Arc;

#[tokio::test]
async fn fresh_identity_is_approved_and_audited() {
    let engine = engine(MockIpReputation { score: 0, fail: false });
    let assessment = engine.assess(&attempt("new@example.com", 3000)).await;
    assert_eq!(assessment.action, FraudAction::Approve);
    assert_eq!(assessment.risk_score, 0);
    assert_eq!(engine.assessments.len().await, 1);
}

#[tokio::test]
async fn spend_and_fingerprint_mismatch_lands_in_review() {
    let engine = engine(MockIpReputation { score: 0, fail: false });
    let at = Utc::now();
    for fp in ["fp_a", "fp_b", "fp_c"] {
        engine
            .history
            .record(
                "heavy@example.com",
                AttemptRecord {
                    amount_minor: 160_000,
                    at,
                    method_fingerprint: Some(fp.to_string()),
                },
            )
            .await;
    }

    let mut attempt = attempt("heavy@example.com", 160_000);
    attempt.at = at;
    attempt.payment_method_fingerprint = Some("fp_new".to_string());
    let assessment = engine.assess(&attempt).await;

    // 30 (daily spend) + 15 (mismatch graded on 3 known fingerprints) = 45.
    assert_eq!(assessment.risk_score, 45);
    assert_eq!(assessment.action, FraudAction::Review);
    assert!(assessment
        .risk_factors
        .contains(&"daily_spend_ceiling".to_string()));
    assert!(assessment
        .risk_factors
        .contains(&"method_fingerprint_mismatch".to_string()));
}

#[tokio::test]
async fn velocity_plus_spend_blocks_and_is_still_persisted() {
    let engine = engine(MockIpReputation { score: 0, fail: false });
    let at = Utc::now();
    for _ in 0..5 {
        engine
            .history
            .record(
                "burst@example.com",
                AttemptRecord {
                    amount_minor: 120_000,
                    at: at - Duration::minutes(2),
                    method_fingerprint: None,
                },
            )
            .await;
    }

    let mut attempt = attempt("burst@example.com", 120_000);
    attempt.at = at - Duration::minutes(2);
    let assessment = engine.assess(&attempt).await;
    // 40 (velocity) + 30 (daily spend ceiling) = 70.
    assert_eq!(assessment.risk_score, 70);
    assert_eq!(assessment.action, FraudAction::Block);
    assert_eq!(engine.assessments.len().await, 1);
}

#[tokio::test]
async fn signal_outage_fails_closed_to_review() {
    let engine = engine(MockIpReputation { score: 0, fail: true });
    let mut attempt = attempt("clean@example.com", 3000);
    attempt.client_ip = Some("203.0.113.7".to_string());

    let assessment = engine.assess(&attempt).await;
    assert_eq!(assessment.action, FraudAction::Review);
    assert!(assessment
        .risk_factors
        .contains(&"assessment_error".to_string()));
}

#[tokio::test]
async fn bad_network_reputation_is_graded() {
    let engine = engine(MockIpReputation { score: 100, fail: false });
    let mut attempt = attempt("clean@example.com", 3000);
    attempt.client_ip = Some("198.51.100.1".to_string());

    let assessment = engine.assess(&attempt).await;
    assert_eq!(assessment.breakdown.ip_reputation, 30);
    assert_eq!(assessment.action, FraudAction::Approve);
}

#[tokio::test]
async fn amount_outlier_scores_against_customer_history() {
    let engine = engine(MockIpReputation { score: 0, fail: false });
    for _ in 0..4 {
        engine
            .history
            .record(
                "steady@example.com",
                AttemptRecord {
                    amount_minor: 3000,
                    at: Utc::now() - Duration::days(2),
                    method_fingerprint: None,
                },
            )
            .await;
    }

    let assessment = engine.assess(&attempt("steady@example.com", 50_000)).await;
    assert_eq!(assessment.breakdown.amount_outlier, 20);
}

fn engine(reputation: MockIpReputation) -> FraudEngine {
    FraudEngine {
        policy: RiskPolicy::default(),
        history: AttemptHistory::new(),
        reputation: Arc::new(reputation),
        assessments: AssessmentStore::new(),
    }
}

fn attempt(identity: &str, amount_minor: i64) -> PaymentAttempt {
    PaymentAttempt {
        customer_identity: identity.to_string(),
        amount_minor,
        currency: "EUR".to_string(),
        payment_method_fingerprint: None,
        client_ip: None,
        at: Utc::now(),
    }
}
