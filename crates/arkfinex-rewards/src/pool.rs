//! Distribution period input: pool, participants and pool policy

use crate::error::{check_percent, Result, RewardsError};
use crate::tiers::Tier;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Pool-wide payout policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPolicy {
    /// Participants below this many adjusted RVUs receive nothing
    #[serde(default = "default_min_rvu_for_payout")]
    pub min_rvu_for_payout: u64,

    /// Ceiling on the share of the pool a single participant may receive (0-100)
    #[serde(default = "default_max_payout_percent")]
    pub max_payout_percent: Decimal,

    /// How the pool was sized from platform fees. Informational only.
    #[serde(default = "default_platform_revenue_percent")]
    pub platform_revenue_percent: Decimal,
}

fn default_min_rvu_for_payout() -> u64 {
    100
}

fn default_max_payout_percent() -> Decimal {
    Decimal::from(15)
}

fn default_platform_revenue_percent() -> Decimal {
    Decimal::from(20)
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            min_rvu_for_payout: default_min_rvu_for_payout(),
            max_payout_percent: default_max_payout_percent(),
            platform_revenue_percent: default_platform_revenue_percent(),
        }
    }
}

impl PoolPolicy {
    /// Threshold as a decimal
    pub fn min_rvus(&self) -> Decimal {
        Decimal::from(self.min_rvu_for_payout)
    }

    /// Validate percentage bounds
    pub fn validate(&self) -> Result<()> {
        check_percent("maxPayoutPercent", self.max_payout_percent)?;
        check_percent("platformRevenuePercent", self.platform_revenue_percent)
    }
}

/// One participant's accrued balance for a period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: String,

    pub tier: Tier,

    /// RVUs accrued from the ledger before tier adjustment
    #[serde(rename = "rawRVUs")]
    pub raw_rvus: Decimal,

    /// Transaction types that contributed to the accrual
    #[serde(default)]
    pub activity_types: BTreeSet<String>,
}

impl Participant {
    /// Create a participant with no recorded activity types
    pub fn new(participant_id: impl Into<String>, tier: Tier, raw_rvus: Decimal) -> Self {
        Self {
            participant_id: participant_id.into(),
            tier,
            raw_rvus,
            activity_types: BTreeSet::new(),
        }
    }

    /// Record an activity type
    pub fn with_activity(mut self, type_id: impl Into<String>) -> Self {
        self.activity_types.insert(type_id.into());
        self
    }
}

/// Reward pool for one distribution period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPool {
    pub period_id: String,

    pub period_start: NaiveDate,

    pub period_end: NaiveDate,

    /// Currency available for distribution
    pub pool_amount: Decimal,

    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl RewardPool {
    /// Create an empty pool
    pub fn new(
        period_id: impl Into<String>,
        period_start: NaiveDate,
        period_end: NaiveDate,
        pool_amount: Decimal,
    ) -> Self {
        Self {
            period_id: period_id.into(),
            period_start,
            period_end,
            pool_amount,
            participants: Vec::new(),
        }
    }

    /// Add a participant
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    /// Validate dates, amount and participant balances
    pub fn validate(&self) -> Result<()> {
        if self.pool_amount <= Decimal::ZERO {
            return Err(RewardsError::NonPositivePoolAmount(self.pool_amount));
        }
        if self.period_end < self.period_start {
            return Err(RewardsError::InvalidPeriod {
                start: self.period_start,
                end: self.period_end,
            });
        }

        let mut seen = HashSet::with_capacity(self.participants.len());
        for p in &self.participants {
            if p.raw_rvus < Decimal::ZERO {
                return Err(RewardsError::NegativeRvus {
                    participant_id: p.participant_id.clone(),
                    rvus: p.raw_rvus,
                });
            }
            if !seen.insert(p.participant_id.as_str()) {
                return Err(RewardsError::DuplicateParticipant(p.participant_id.clone()));
            }
        }
        Ok(())
    }
}
