//! Error types for reward accrual and allocation

use crate::tiers::Tier;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for reward operations
pub type Result<T> = std::result::Result<T, RewardsError>;

/// Broad classification of a [`RewardsError`].
///
/// Neither kind is retryable: the caller has to fix the input and call again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad static configuration (tier rules, transaction rules, promotion)
    Config,
    /// Bad per-call input (pool dates, RVU balances, policy bounds)
    Validation,
}

/// Errors raised while validating inputs or computing a distribution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewardsError {
    // === Configuration Errors ===
    /// A participant's tier has no rule in the tier table
    #[error("No tier rule configured for tier '{0}'")]
    MissingTierRule(Tier),

    /// Payout type string is neither `percentage` nor `fixed`
    #[error("Unknown payout type: {0}")]
    UnknownPayoutType(String),

    /// Pool amount must be strictly positive
    #[error("Pool amount must be positive, got {0}")]
    NonPositivePoolAmount(Decimal),

    /// Tier multiplier below 1.0
    #[error("Tier '{tier}' multiplier must be at least 1.0, got {multiplier}")]
    InvalidTierMultiplier { tier: Tier, multiplier: Decimal },

    /// Promotion window is malformed
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),

    /// Transaction type rule is malformed
    #[error("Invalid rule for transaction type '{type_id}': {reason}")]
    InvalidTransactionRule { type_id: String, reason: String },

    // === Validation Errors ===
    /// Period ends before it starts
    #[error("Period end {end} is before period start {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    /// Participant has a negative RVU balance
    #[error("Participant '{participant_id}' has negative RVUs: {rvus}")]
    NegativeRvus { participant_id: String, rvus: Decimal },

    /// A percentage lies outside [0, 100]
    #[error("{field} must be within [0, 100], got {value}")]
    PercentOutOfRange { field: String, value: Decimal },

    /// Same participant listed twice in one pool
    #[error("Participant '{0}' appears more than once in the pool")]
    DuplicateParticipant(String),

    /// Participant has no tier membership
    #[error("No tier membership for participant '{0}'")]
    UnknownParticipant(String),

    /// Amount that must be non-negative was negative
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: Decimal },

    /// Intermediate value exceeded the decimal range
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),
}

impl RewardsError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingTierRule(_)
            | Self::UnknownPayoutType(_)
            | Self::NonPositivePoolAmount(_)
            | Self::InvalidTierMultiplier { .. }
            | Self::InvalidPromotion(_)
            | Self::InvalidTransactionRule { .. } => ErrorKind::Config,
            _ => ErrorKind::Validation,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::MissingTierRule(_) => 2001,
            Self::UnknownPayoutType(_) => 2002,
            Self::NonPositivePoolAmount(_) => 2003,
            Self::InvalidTierMultiplier { .. } => 2004,
            Self::InvalidPromotion(_) => 2005,
            Self::InvalidTransactionRule { .. } => 2006,
            Self::InvalidPeriod { .. } => 3001,
            Self::NegativeRvus { .. } => 3002,
            Self::PercentOutOfRange { .. } => 3003,
            Self::DuplicateParticipant(_) => 3004,
            Self::UnknownParticipant(_) => 3005,
            Self::InvalidAmount { .. } => 3006,
            Self::ArithmeticOverflow(_) => 3007,
        }
    }

    pub(crate) fn percent_out_of_range(field: impl Into<String>, value: Decimal) -> Self {
        Self::PercentOutOfRange {
            field: field.into(),
            value,
        }
    }
}

/// Check that a percentage lies in [0, 100]
pub(crate) fn check_percent(field: impl Into<String>, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(RewardsError::percent_out_of_range(field, value));
    }
    Ok(())
}
