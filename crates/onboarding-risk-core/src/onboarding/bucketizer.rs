use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::RiskLevel;

/// Map an average score (0–5) to its tier. Upper bounds are inclusive.
/// Anything outside [0, 5] falls back to `Low`.
pub fn bucketize(avg_score: Decimal) -> RiskLevel {
    if avg_score < Decimal::ZERO || avg_score > dec!(5) {
        RiskLevel::Low
    } else if avg_score <= dec!(1) {
        RiskLevel::Low
    } else if avg_score <= dec!(2) {
        RiskLevel::MediumLow
    } else if avg_score <= dec!(3) {
        RiskLevel::Medium
    } else if avg_score <= dec!(4) {
        RiskLevel::MediumHigh
    } else {
        RiskLevel::High
    }
}

/// Float entry point for callers outside the crate. NaN and infinities are `Low`.
pub fn bucketize_f64(avg_score: f64) -> RiskLevel {
    Decimal::from_f64(avg_score).map_or(RiskLevel::Low, bucketize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_bounds_inclusive() {
        assert_eq!(bucketize(dec!(0)), RiskLevel::Low);
        assert_eq!(bucketize(dec!(1.0)), RiskLevel::Low);
        assert_eq!(bucketize(dec!(2.0)), RiskLevel::MediumLow);
        assert_eq!(bucketize(dec!(3.0)), RiskLevel::Medium);
        assert_eq!(bucketize(dec!(4.0)), RiskLevel::MediumHigh);
        assert_eq!(bucketize(dec!(5)), RiskLevel::High);
    }

    #[test]
    fn test_just_above_bounds() {
        assert_eq!(bucketize(dec!(1.0001)), RiskLevel::MediumLow);
        assert_eq!(bucketize(dec!(2.5)), RiskLevel::Medium);
        assert_eq!(bucketize(dec!(3.3333333333)), RiskLevel::MediumHigh);
        assert_eq!(bucketize(dec!(4.01)), RiskLevel::High);
    }

    #[test]
    fn test_out_of_domain_is_low() {
        assert_eq!(bucketize(dec!(-0.5)), RiskLevel::Low);
        assert_eq!(bucketize(dec!(5.01)), RiskLevel::Low);
        assert_eq!(bucketize_f64(f64::NAN), RiskLevel::Low);
        assert_eq!(bucketize_f64(f64::INFINITY), RiskLevel::Low);
        assert_eq!(bucketize_f64(3.5), RiskLevel::MediumHigh);
    }
}
