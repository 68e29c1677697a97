use crate::gateways::{AuthorizeRequest, IpReputation, KycService, PaymentGateway, RateProvider};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub struct MockGateway {
    pub behavior: String,
    pub authorize_calls: AtomicU64,
    pub refund_calls: AtomicU64,
    pub transfer_calls: AtomicU64,
}

impl MockGateway {
    pub fn new(behavior: &str) -> Self {
        Self {
            behavior: behavior.to_string(),
            authorize_calls: AtomicU64::new(0),
            refund_calls: AtomicU64::new(0),
            transfer_calls: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authorize(&self, _request: AuthorizeRequest) -> Result<String> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior.as_str() {
            "ALWAYS_DECLINE" => Err(anyhow!("mock decline")),
            _ => Ok(format!("ch_{}", uuid::Uuid::new_v4())),
        }
    }

    async fn refund(&self, _gateway_reference_id: &str, _amount_minor: i64) -> Result<()> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if self.behavior == "REFUND_FAILS" {
            return Err(anyhow!("mock refund failure"));
        }
        Ok(())
    }

    async fn transfer_to_consultant(
        &self,
        _gateway_reference_id: &str,
        _amount_minor: i64,
    ) -> Result<()> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if self.behavior == "TRANSFER_FAILS" {
            return Err(anyhow!("mock transfer failure"));
        }
        Ok(())
    }
}

pub struct MockKyc {
    pub eligible: Arc<AtomicBool>,
}

impl MockKyc {
    pub fn eligible() -> Self {
        Self {
            eligible: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn ineligible() -> Self {
        Self {
            eligible: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl KycService for MockKyc {
    async fn is_payout_eligible(&self, _consultant_id: &str) -> Result<bool> {
        Ok(self.eligible.load(Ordering::SeqCst))
    }
}

pub struct StaticRateProvider {
    pub rates: HashMap<(String, String), Decimal>,
    pub fail: Arc<AtomicBool>,
    pub calls: AtomicU64,
}

impl StaticRateProvider {
    pub fn new(rates: Vec<(&str, &str, Decimal)>) -> Self {
        Self {
            rates: rates
                .into_iter()
                .map(|(f, t, r)| ((f.to_string(), t.to_string()), r))
                .collect(),
            fail: Arc::new(AtomicBool::new(false)),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl RateProvider for StaticRateProvider {
    async fn spot_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("rate provider unavailable"));
        }
        self.rates
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| anyhow!("no rate for {from}->{to}"))
    }
}

pub struct MockIpReputation {
    pub score: u32,
    pub fail: bool,
}

#[async_trait::async_trait]
impl IpReputation for MockIpReputation {
    async fn reputation(&self, _ip: &str) -> Result<u32> {
        if self.fail {
            return Err(anyhow!("reputation service unavailable"));
        }
        Ok(self.score)
    }
}
