//! Transaction type earn rules

use crate::error::{Result, RewardsError};
use crate::{round_currency, round_rvus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a qualifying transaction pays out directly
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutType {
    /// Percentage of the transaction amount
    Percentage,
    /// Flat currency amount per transaction
    #[serde(alias = "fixedPayout")]
    Fixed,
}

impl FromStr for PayoutType {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" | "fixedPayout" => Ok(Self::Fixed),
            other => Err(RewardsError::UnknownPayoutType(other.to_string())),
        }
    }
}

impl fmt::Display for PayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => f.write_str("percentage"),
            Self::Fixed => f.write_str("fixed"),
        }
    }
}

/// Earn policy for one activity type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTypeRule {
    /// Key such as `invoice_paid`
    pub type_id: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// RVUs earned per currency unit
    pub rvu_per_dollar: Decimal,

    /// Smallest qualifying amount
    #[serde(default)]
    pub min_amount: Option<Decimal>,

    /// Largest qualifying amount (unset = unbounded)
    #[serde(default)]
    pub max_amount: Option<Decimal>,

    /// Upper bound on RVUs from a single transaction
    #[serde(default)]
    pub cap_per_transaction: Option<Decimal>,

    #[serde(default = "default_payout_type")]
    pub payout_type: PayoutType,

    /// Active when `payout_type` is percentage
    #[serde(default)]
    pub payout_percent: Decimal,

    /// Active when `payout_type` is fixed
    #[serde(default)]
    pub fixed_payout: Decimal,
}

fn default_true() -> bool {
    true
}

fn default_payout_type() -> PayoutType {
    PayoutType::Percentage
}

impl TransactionTypeRule {
    /// Create an enabled, unbounded, uncapped rule
    pub fn new(type_id: impl Into<String>, rvu_per_dollar: Decimal) -> Self {
        Self {
            type_id: type_id.into(),
            enabled: true,
            rvu_per_dollar,
            min_amount: None,
            max_amount: None,
            cap_per_transaction: None,
            payout_type: PayoutType::Percentage,
            payout_percent: Decimal::ZERO,
            fixed_payout: Decimal::ZERO,
        }
    }

    /// Whether `amount` falls inside `[min_amount, max_amount]`
    pub fn qualifies(&self, amount: Decimal) -> bool {
        let min = self.min_amount.unwrap_or(Decimal::ZERO);
        amount >= min && self.max_amount.map_or(true, |max| amount <= max)
    }

    /// RVUs earned by one transaction, ignoring `enabled` and bounds
    pub fn earned_rvus(&self, amount: Decimal) -> Result<Decimal> {
        let earned = amount
            .checked_mul(self.rvu_per_dollar)
            .ok_or(RewardsError::ArithmeticOverflow("transaction RVUs"))?;
        let earned = match self.cap_per_transaction {
            Some(cap) => earned.min(cap),
            None => earned,
        };
        Ok(round_rvus(earned))
    }

    /// Direct payout for one qualifying transaction under the active payout type
    pub fn payout_value(&self, amount: Decimal) -> Result<Decimal> {
        match self.payout_type {
            PayoutType::Percentage => {
                let value = amount
                    .checked_mul(self.payout_percent)
                    .ok_or(RewardsError::ArithmeticOverflow("transaction payout"))?;
                Ok(round_currency(value / Decimal::ONE_HUNDRED))
            }
            PayoutType::Fixed => Ok(self.fixed_payout),
        }
    }

    /// Validate the rule as stored under `key` in a rule table
    pub fn validate_keyed(&self, key: &str) -> Result<()> {
        if key != self.type_id {
            return Err(RewardsError::InvalidTransactionRule {
                type_id: key.to_string(),
                reason: format!("keyed as {} but typeId is {}", key, self.type_id),
            });
        }
        self.validate()
    }

    /// Validate the rule
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RewardsError::InvalidTransactionRule {
            type_id: self.type_id.clone(),
            reason,
        };

        if self.type_id.trim().is_empty() {
            return Err(invalid("type id is empty".into()));
        }
        if self.rvu_per_dollar < Decimal::ZERO {
            return Err(invalid(format!(
                "rvuPerDollar must be non-negative, got {}",
                self.rvu_per_dollar
            )));
        }
        if let Some(min) = self.min_amount {
            if min < Decimal::ZERO {
                return Err(invalid(format!("minAmount is negative: {}", min)));
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(invalid(format!(
                    "minAmount {} exceeds maxAmount {}",
                    min, max
                )));
            }
        }
        if let Some(cap) = self.cap_per_transaction {
            if cap < Decimal::ZERO {
                return Err(invalid(format!("capPerTransaction is negative: {}", cap)));
            }
        }
        match self.payout_type {
            PayoutType::Percentage => {
                if self.payout_percent < Decimal::ZERO
                    || self.payout_percent > Decimal::ONE_HUNDRED
                {
                    return Err(invalid(format!(
                        "payoutPercent must be within [0, 100], got {}",
                        self.payout_percent
                    )));
                }
            }
            PayoutType::Fixed => {
                if self.fixed_payout < Decimal::ZERO {
                    return Err(invalid(format!(
                        "fixedPayout is negative: {}",
                        self.fixed_payout
                    )));
                }
            }
        }
        Ok(())
    }
}
