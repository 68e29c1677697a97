use crate::error::EscrowError;
use crate::gateways::RateProvider;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

pub mod cache;

use cache::RateCache;

/// Minor-unit exponent per ISO 4217. The default of 2 covers everything the
/// platform settles in today; zero- and three-decimal currencies are listed
/// so conversion rounds to a representable amount.
pub fn minor_unit_exponent(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" => 3,
        _ => 2,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Conversion {
    pub amount_minor: i64,
    pub rate: Decimal,
    pub stale: bool,
}

#[derive(Clone)]
pub struct CurrencyConverter {
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
}

impl CurrencyConverter {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        ttl_seconds: i64,
        provider_timeout: std::time::Duration,
    ) -> Self {
        Self {
            provider,
            cache: RateCache::new(ttl_seconds, provider_timeout),
        }
    }

    pub async fn convert(
        &self,
        amount_minor: i64,
        from: &str,
        to: &str,
    ) -> Result<Conversion, EscrowError> {
        if from == to {
            return Ok(Conversion {
                amount_minor,
                rate: Decimal::ONE,
                stale: false,
            });
        }

        let quote = self.cache.rate(from, to, self.provider.as_ref()).await?;

        let from_scale = Decimal::from(10i64.pow(minor_unit_exponent(from)));
        let to_scale = Decimal::from(10i64.pow(minor_unit_exponent(to)));
        let converted = (Decimal::from(amount_minor) / from_scale * quote.rate * to_scale)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        let amount_minor = converted.to_i64().ok_or_else(|| {
            EscrowError::AmountInvalid("converted amount does not fit in minor units".to_string())
        })?;

        Ok(Conversion {
            amount_minor,
            rate: quote.rate,
            stale: quote.stale,
        })
    }
}
