//! # ARKFinex Rewards - RVU Accrual & Reward Pool Distribution
//!
//! Calculation model behind the RWA reward distribution: participants earn
//! RVUs from qualifying transactions, tiers scale those RVUs, and each
//! period's fee-derived pool is split in proportion to the adjusted totals.
//!
//! ## Key Features
//!
//! - **Accrual**: per-transaction-type earn rates with amount bounds and caps
//! - **Tier multipliers**: starter through MNC
//! - **Promotions**: time-boxed bonus multipliers with a per-participant cap
//! - **Pool policy**: payout threshold and per-participant payout ceiling
//! - **Fixed-point**: every amount is a [`rust_decimal::Decimal`]
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   accrue    ┌──────────────┐   allocate   ┌──────────────────┐
//! │  Ledger  │ ──────────► │  RewardPool  │ ───────────► │ AllocationReport │
//! └──────────┘  tx rules   └──────────────┘  tiers/promo └──────────────────┘
//!                                              policy       results + residual
//! ```
//!
//! The allocator is a pure function: no I/O, no shared state, safe to call
//! from any number of threads on independent inputs.

pub mod accrual;
pub mod allocator;
pub mod config;
pub mod error;
pub mod estimate;
pub mod pool;
pub mod promotion;
pub mod tiers;
pub mod transactions;

// Re-exports
pub use accrual::{AccrualSummary, LedgerTransaction, ParticipantAccrual, SkipReason, TransactionAccrualEngine};
pub use allocator::{allocate, build_report, residual, AllocationReport, AllocationResult, RewardPoolAllocator};
pub use config::{ConfigLoadError, RewardsConfig};
pub use error::{ErrorKind, Result, RewardsError};
pub use estimate::{quick_estimate, QuickEstimate};
pub use pool::{Participant, PoolPolicy, RewardPool};
pub use promotion::PromotionWindow;
pub use tiers::{Tier, TierRule, TierRules};
pub use transactions::{PayoutType, TransactionTypeRule};

use rust_decimal::{Decimal, RoundingStrategy};

/// Precision constants
pub mod constants {
    use rust_decimal::Decimal;

    /// Currency minor units (cents)
    pub const CURRENCY_DECIMALS: u32 = 2;

    /// RVU precision
    pub const RVU_DECIMALS: u32 = 4;

    /// Flat multiplier used by the distribution simulator (growth tier)
    pub const PREVIEW_MULTIPLIER: Decimal = Decimal::from_parts(12, 0, 0, false, 1);
}

/// Round a currency amount to minor units, toward zero
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(constants::CURRENCY_DECIMALS, RoundingStrategy::ToZero)
}

/// Round an RVU quantity to RVU precision, toward zero
pub fn round_rvus(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(constants::RVU_DECIMALS, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounding_toward_zero() {
        assert_eq!(round_currency(dec!(12.349)), dec!(12.34));
        assert_eq!(round_rvus(dec!(0.08029)), dec!(0.0802));
    }

    #[test]
    fn test_preview_multiplier() {
        assert_eq!(constants::PREVIEW_MULTIPLIER, dec!(1.2));
    }
}
