//! Quick reward estimate for the distribution simulator.
//!
//! Applies the flat growth-tier preview multiplier regardless of the
//! participant's real tier and ignores thresholds, caps and promotions. It
//! is a preview and does not agree with [`crate::allocator::allocate`].

use crate::constants::PREVIEW_MULTIPLIER;
use crate::error::{Result, RewardsError};
use crate::round_currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simulator output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickEstimate {
    #[serde(rename = "adjustedRVUs")]
    pub adjusted_rvus: Decimal,
    pub share_of_pool: Decimal,
    pub estimated_reward: Decimal,
}

/// Estimate a reward from a participant's RVUs and the network total
pub fn quick_estimate(rvus: Decimal, pool_amount: Decimal, network_rvus: Decimal) -> Result<QuickEstimate> {
    for (field, value) in [
        ("rvus", rvus),
        ("poolAmount", pool_amount),
        ("networkRvus", network_rvus),
    ] {
        if value < Decimal::ZERO {
            return Err(RewardsError::InvalidAmount {
                field: field.to_string(),
                value,
            });
        }
    }

    let adjusted_rvus = rvus
        .checked_mul(PREVIEW_MULTIPLIER)
        .ok_or(RewardsError::ArithmeticOverflow("preview RVUs"))?;
    if network_rvus.is_zero() {
        return Ok(QuickEstimate {
            adjusted_rvus,
            share_of_pool: Decimal::ZERO,
            estimated_reward: Decimal::ZERO,
        });
    }

    let share_of_pool = adjusted_rvus
        .checked_div(network_rvus)
        .ok_or(RewardsError::ArithmeticOverflow("preview share"))?;
    let estimated_reward = share_of_pool
        .checked_mul(pool_amount)
        .map(round_currency)
        .ok_or(RewardsError::ArithmeticOverflow("preview reward"))?;

    Ok(QuickEstimate {
        adjusted_rvus,
        share_of_pool,
        estimated_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_growth_multiplier() {
        let est = quick_estimate(dec!(10000), dec!(100000), dec!(1200000)).unwrap();
        assert_eq!(est.adjusted_rvus, dec!(12000));
        assert_eq!(est.share_of_pool, dec!(0.01));
        assert_eq!(est.estimated_reward, dec!(1000));
    }

    #[test]
    fn test_zero_network() {
        let est = quick_estimate(dec!(50), dec!(1000), dec!(0)).unwrap();
        assert_eq!(est.estimated_reward, dec!(0));
    }

    #[test]
    fn test_negative_input_rejected() {
        assert!(matches!(
            quick_estimate(dec!(-1), dec!(1000), dec!(10)),
            Err(RewardsError::InvalidAmount { .. })
        ));
    }
}
