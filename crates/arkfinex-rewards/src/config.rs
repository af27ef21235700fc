//! Reward program configuration
//!
//! A single immutable value holding the transaction, tier, promotion and pool
//! settings. Edits produce a new value via the `with_*` methods.

use crate::accrual::TransactionAccrualEngine;
use crate::allocator::RewardPoolAllocator;
use crate::error::Result;
use crate::pool::PoolPolicy;
use crate::promotion::PromotionWindow;
use crate::tiers::{Tier, TierRule, TierRules};
use crate::transactions::{PayoutType, TransactionTypeRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Failure loading or rendering a configuration file
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] crate::error::RewardsError),
}

/// Complete rewards configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsConfig {
    /// Earn rules keyed by type id
    #[serde(default = "default_transaction_types")]
    pub transaction_types: BTreeMap<String, TransactionTypeRule>,

    /// Tier table
    #[serde(default)]
    pub tiers: TierRules,

    /// Optional promotion window
    #[serde(default)]
    pub promotion: Option<PromotionWindow>,

    /// Pool policy
    #[serde(default)]
    pub pool: PoolPolicy,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            transaction_types: default_transaction_types(),
            tiers: TierRules::default(),
            promotion: None,
            pool: PoolPolicy::default(),
        }
    }
}

fn default_transaction_types() -> BTreeMap<String, TransactionTypeRule> {
    let rules = [
        TransactionTypeRule {
            min_amount: Some(Decimal::from(10)),
            cap_per_transaction: Some(Decimal::from(5000)),
            payout_percent: Decimal::new(25, 1),
            ..TransactionTypeRule::new("invoice_paid", Decimal::new(802, 4))
        },
        TransactionTypeRule {
            min_amount: Some(Decimal::from(10)),
            cap_per_transaction: Some(Decimal::from(2500)),
            payout_percent: Decimal::new(15, 1),
            ..TransactionTypeRule::new("bill_paid", Decimal::new(5, 2))
        },
        TransactionTypeRule {
            min_amount: Some(Decimal::ONE),
            max_amount: Some(Decimal::from(25000)),
            payout_percent: Decimal::ONE,
            ..TransactionTypeRule::new("pos_sale", Decimal::new(3, 2))
        },
        TransactionTypeRule {
            payout_type: PayoutType::Fixed,
            fixed_payout: Decimal::from(5),
            cap_per_transaction: Some(Decimal::from(1000)),
            ..TransactionTypeRule::new("payroll_run", Decimal::new(2, 2))
        },
        TransactionTypeRule {
            enabled: false,
            payout_percent: Decimal::new(5, 1),
            ..TransactionTypeRule::new("card_spend", Decimal::new(1, 2))
        },
    ];
    rules.into_iter().map(|r| (r.type_id.clone(), r)).collect()
}

/// Resolve every `payoutType` string before the typed parse
fn check_payout_types(table: &toml::Table) -> Result<()> {
    let Some(types) = table.get("transactionTypes").and_then(|v| v.as_table()) else {
        return Ok(());
    };
    for rule in types.values() {
        if let Some(raw) = rule.get("payoutType").and_then(|v| v.as_str()) {
            raw.parse::<PayoutType>()?;
        }
    }
    Ok(())
}

impl RewardsConfig {
    /// Parse from TOML and validate
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigLoadError> {
        let table: toml::Table = content.parse()?;
        check_payout_types(&table)?;
        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> std::result::Result<String, ConfigLoadError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        for (key, rule) in &self.transaction_types {
            rule.validate_keyed(key)?;
        }
        self.tiers.validate()?;
        if let Some(promo) = &self.promotion {
            promo.validate()?;
        }
        self.pool.validate()
    }

    /// Copy with one tier rule replaced
    pub fn with_tier(&self, tier: Tier, rule: TierRule) -> Self {
        Self {
            tiers: self.tiers.with_rule(tier, rule),
            ..self.clone()
        }
    }

    /// Copy with one transaction type rule inserted or replaced
    pub fn with_transaction_type(&self, rule: TransactionTypeRule) -> Self {
        let mut transaction_types = self.transaction_types.clone();
        transaction_types.insert(rule.type_id.clone(), rule);
        Self {
            transaction_types,
            ..self.clone()
        }
    }

    /// Copy with the promotion replaced
    pub fn with_promotion(&self, promotion: Option<PromotionWindow>) -> Self {
        Self {
            promotion,
            ..self.clone()
        }
    }

    /// Copy with the pool policy replaced
    pub fn with_pool_policy(&self, pool: PoolPolicy) -> Self {
        Self {
            pool,
            ..self.clone()
        }
    }

    /// Allocator bound to this configuration
    pub fn allocator(&self) -> RewardPoolAllocator {
        RewardPoolAllocator::from_config(self)
    }

    /// Accrual engine for this configuration's transaction rules
    pub fn accrual_engine(&self) -> Result<TransactionAccrualEngine> {
        TransactionAccrualEngine::new(self.transaction_types.clone())
    }
}
