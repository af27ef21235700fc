//! # Membership Tiers
//!
//! Tier multipliers scale raw RVU accrual; payout percentages scale what the
//! payout collaborator actually disburses.
//!
//! ## Default Tier Table
//!
//! | Tier | Multiplier | Payout % |
//! |------|------------|----------|
//! | Starter | 1.0x | 50% |
//! | Growth | 1.2x | 60% |
//! | Scale | 1.5x | 70% |
//! | Enterprise | 2.0x | 80% |
//! | MNC | 2.5x | 90% |

use crate::error::{check_percent, Result, RewardsError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Membership tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Entry-level businesses
    Starter,
    /// Growing SMBs
    Growth,
    /// Mid-market
    Scale,
    /// Large enterprises
    Enterprise,
    /// Multinational corporations
    Mnc,
}

impl Tier {
    /// All tiers, lowest first
    pub const ALL: [Tier; 5] = [
        Self::Starter,
        Self::Growth,
        Self::Scale,
        Self::Enterprise,
        Self::Mnc,
    ];

    /// Get tier name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Growth => "growth",
            Self::Scale => "scale",
            Self::Enterprise => "enterprise",
            Self::Mnc => "mnc",
        }
    }

    /// Default rule for tier
    pub fn default_rule(&self) -> TierRule {
        let (multiplier, payout_percent) = match self {
            Self::Starter => (Decimal::ONE, Decimal::from(50)),
            Self::Growth => (Decimal::new(12, 1), Decimal::from(60)),
            Self::Scale => (Decimal::new(15, 1), Decimal::from(70)),
            Self::Enterprise => (Decimal::TWO, Decimal::from(80)),
            Self::Mnc => (Decimal::new(25, 1), Decimal::from(90)),
        };
        TierRule {
            multiplier,
            payout_percent,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tier '{}'", s))
    }
}

/// Policy for one membership tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRule {
    /// Multiplier applied to raw RVU accrual (>= 1.0)
    pub multiplier: Decimal,

    /// Payout scaling applied at disbursement time (0-100)
    pub payout_percent: Decimal,
}

impl TierRule {
    /// Fraction of an allocation the payout collaborator disburses
    pub fn payout_fraction(&self) -> Decimal {
        self.payout_percent / Decimal::ONE_HUNDRED
    }

    /// Validate the rule for `tier`
    pub fn validate(&self, tier: Tier) -> Result<()> {
        if self.multiplier < Decimal::ONE {
            return Err(RewardsError::InvalidTierMultiplier {
                tier,
                multiplier: self.multiplier,
            });
        }
        check_percent(format!("tier '{}' payoutPercent", tier), self.payout_percent)
    }
}

/// Tier table keyed by tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierRules(BTreeMap<Tier, TierRule>);

impl Default for TierRules {
    fn default() -> Self {
        Self(Tier::ALL.iter().map(|t| (*t, t.default_rule())).collect())
    }
}

impl TierRules {
    /// Empty table
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Look up the rule for a tier. No fallback is substituted.
    pub fn get(&self, tier: Tier) -> Result<&TierRule> {
        self.0.get(&tier).ok_or(RewardsError::MissingTierRule(tier))
    }

    /// Return a copy of the table with `tier` set to `rule`
    pub fn with_rule(&self, tier: Tier, rule: TierRule) -> Self {
        let mut rules = self.0.clone();
        rules.insert(tier, rule);
        Self(rules)
    }

    /// Iterate configured tiers
    pub fn iter(&self) -> impl Iterator<Item = (&Tier, &TierRule)> {
        self.0.iter()
    }

    /// Number of configured tiers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tier is configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every configured rule
    pub fn validate(&self) -> Result<()> {
        for (tier, rule) in &self.0 {
            rule.validate(*tier)?;
        }
        Ok(())
    }
}

impl FromIterator<(Tier, TierRule)> for TierRules {
    fn from_iter<I: IntoIterator<Item = (Tier, TierRule)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
