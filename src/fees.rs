use crate::error::EscrowError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee_minor: i64,
    pub consultant_minor: i64,
}

/// Splits a gross amount in minor units into platform fee and consultant
/// share. The fee is rounded half-up; the consultant share is derived by
/// subtraction so the two always add back up to the gross amount.
pub fn compute_split(gross_minor: i64, fee_ratio: Decimal) -> Result<FeeSplit, EscrowError> {
    if gross_minor < 0 {
        return Err(EscrowError::AmountInvalid(format!(
            "gross amount must be non-negative, got {gross_minor}"
        )));
    }
    if fee_ratio < Decimal::ZERO || fee_ratio > Decimal::ONE {
        return Err(EscrowError::AmountInvalid(format!(
            "fee ratio must be within [0, 1], got {fee_ratio}"
        )));
    }

    let fee = (Decimal::from(gross_minor) * fee_ratio)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let fee_minor = fee
        .to_i64()
        .ok_or_else(|| EscrowError::AmountInvalid("fee does not fit in minor units".to_string()))?;

    Ok(FeeSplit {
        fee_minor,
        consultant_minor: gross_minor - fee_minor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn standard_split() {
        let split = compute_split(3000, dec!(0.15)).unwrap();
        assert_eq!(split.fee_minor, 450);
        assert_eq!(split.consultant_minor, 2550);
    }

    #[test]
    fn rounds_half_up() {
        // 1001 * 0.15 = 150.15 -> 150; 990 * 0.15 = 148.5 -> 149
        assert_eq!(compute_split(1001, dec!(0.15)).unwrap().fee_minor, 150);
        assert_eq!(compute_split(990, dec!(0.15)).unwrap().fee_minor, 149);
    }

    #[test]
    fn rejects_negative_gross() {
        assert!(compute_split(-1, dec!(0.15)).is_err());
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        assert!(compute_split(100, dec!(1.5)).is_err());
        assert!(compute_split(100, dec!(-0.1)).is_err());
    }

    #[test]
    fn zero_gross_is_fine() {
        let split = compute_split(0, dec!(0.15)).unwrap();
        assert_eq!(split.fee_minor, 0);
        assert_eq!(split.consultant_minor, 0);
    }
}
