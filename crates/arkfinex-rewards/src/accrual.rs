//! # RVU Accrual
//!
//! Turns a transaction ledger into per-participant raw RVU balances:
//!
//! ```text
//! earned = min(amount * rvu_per_dollar, cap_per_transaction)
//! ```
//!
//! Transactions are skipped when their type has no rule, the rule is
//! disabled, the amount is outside `[min_amount, max_amount]`, or the
//! timestamp falls outside the period.

use crate::error::{Result, RewardsError};
use crate::pool::Participant;
use crate::tiers::Tier;
use crate::transactions::TransactionTypeRule;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One ledger entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub type_id: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub participant_id: String,
}

/// Why a transaction earned nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No rule for the transaction type
    UnknownType,
    /// Rule is switched off
    Disabled,
    /// Amount outside the rule's bounds
    OutOfRange,
    /// Timestamp outside the period
    OutsidePeriod,
}

/// Accrued balance for one participant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAccrual {
    pub participant_id: String,

    #[serde(rename = "rawRVUs")]
    pub raw_rvus: Decimal,

    /// Types that earned RVUs
    pub activity_types: BTreeSet<String>,

    /// Qualifying transactions counted
    pub transaction_count: u64,
}

/// Accrual output for one period
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualSummary {
    /// Balances in order of first qualifying transaction
    pub participants: Vec<ParticipantAccrual>,

    /// Skipped transaction counts by reason
    pub skipped: BTreeMap<SkipReason, u64>,
}

impl AccrualSummary {
    /// Total skipped transactions
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Balance for a participant
    pub fn get(&self, participant_id: &str) -> Option<&ParticipantAccrual> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    /// Build allocator participants using a membership map.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::UnknownParticipant`] if a participant has no tier
    pub fn into_participants(self, memberships: &HashMap<String, Tier>) -> Result<Vec<Participant>> {
        self.participants
            .into_iter()
            .map(|acc| {
                let tier = memberships
                    .get(&acc.participant_id)
                    .copied()
                    .ok_or_else(|| RewardsError::UnknownParticipant(acc.participant_id.clone()))?;
                Ok(Participant {
                    participant_id: acc.participant_id,
                    tier,
                    raw_rvus: acc.raw_rvus,
                    activity_types: acc.activity_types,
                })
            })
            .collect()
    }
}

/// Applies transaction type rules to a ledger
#[derive(Clone, Debug)]
pub struct TransactionAccrualEngine {
    rules: BTreeMap<String, TransactionTypeRule>,
}

impl TransactionAccrualEngine {
    /// Create an engine, validating every rule
    pub fn new(rules: BTreeMap<String, TransactionTypeRule>) -> Result<Self> {
        for (key, rule) in &rules {
            rule.validate_keyed(key)?;
        }
        Ok(Self { rules })
    }

    /// Rule for a type
    pub fn rule(&self, type_id: &str) -> Option<&TransactionTypeRule> {
        self.rules.get(type_id)
    }

    /// Accrue RVUs for transactions dated within `[period_start, period_end]`
    pub fn accrue(
        &self,
        ledger: &[LedgerTransaction],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<AccrualSummary> {
        if period_end < period_start {
            return Err(RewardsError::InvalidPeriod {
                start: period_start,
                end: period_end,
            });
        }

        let mut balances: IndexMap<String, ParticipantAccrual> = IndexMap::new();
        let mut skipped: BTreeMap<SkipReason, u64> = BTreeMap::new();

        for tx in ledger {
            let earned = match self.evaluate(tx, period_start, period_end)? {
                Ok(earned) => earned,
                Err(reason) => {
                    tracing::debug!(
                        participant = %tx.participant_id,
                        type_id = %tx.type_id,
                        amount = %tx.amount,
                        ?reason,
                        "transaction skipped"
                    );
                    *skipped.entry(reason).or_insert(0) += 1;
                    continue;
                }
            };

            let entry = balances
                .entry(tx.participant_id.clone())
                .or_insert_with(|| ParticipantAccrual {
                    participant_id: tx.participant_id.clone(),
                    raw_rvus: Decimal::ZERO,
                    activity_types: BTreeSet::new(),
                    transaction_count: 0,
                });
            entry.raw_rvus = entry
                .raw_rvus
                .checked_add(earned)
                .ok_or(RewardsError::ArithmeticOverflow("accrued RVUs"))?;
            entry.activity_types.insert(tx.type_id.clone());
            entry.transaction_count += 1;
        }

        let summary = AccrualSummary {
            participants: balances.into_values().collect(),
            skipped,
        };

        tracing::info!(
            transactions = ledger.len(),
            participants = summary.participants.len(),
            skipped = summary.skipped_total(),
            %period_start,
            %period_end,
            "ledger accrued"
        );

        Ok(summary)
    }

    fn evaluate(
        &self,
        tx: &LedgerTransaction,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<std::result::Result<Decimal, SkipReason>> {
        let day = tx.timestamp.date_naive();
        if day < period_start || day > period_end {
            return Ok(Err(SkipReason::OutsidePeriod));
        }
        let Some(rule) = self.rules.get(&tx.type_id) else {
            return Ok(Err(SkipReason::UnknownType));
        };
        if !rule.enabled {
            return Ok(Err(SkipReason::Disabled));
        }
        if !rule.qualifies(tx.amount) {
            return Ok(Err(SkipReason::OutOfRange));
        }
        rule.earned_rvus(tx.amount).map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(type_id: &str, amount: Decimal, ts: DateTime<Utc>, who: &str) -> LedgerTransaction {
        LedgerTransaction {
            type_id: type_id.into(),
            amount,
            timestamp: ts,
            participant_id: who.into(),
        }
    }

    fn engine() -> TransactionAccrualEngine {
        let mut rules = BTreeMap::new();
        rules.insert(
            "invoice_paid".to_string(),
            TransactionTypeRule {
                min_amount: Some(dec!(10)),
                max_amount: Some(dec!(100000)),
                cap_per_transaction: Some(dec!(100)),
                ..TransactionTypeRule::new("invoice_paid", dec!(0.1))
            },
        );
        rules.insert(
            "pos_sale".to_string(),
            TransactionTypeRule::new("pos_sale", dec!(0.05)),
        );
        rules.insert(
            "payroll_run".to_string(),
            TransactionTypeRule {
                enabled: false,
                ..TransactionTypeRule::new("payroll_run", dec!(1))
            },
        );
        TransactionAccrualEngine::new(rules).unwrap()
    }

    #[test]
    fn test_accrue_sums_per_participant() {
        let ledger = vec![
            tx("invoice_paid", dec!(500), at(2026, 3, 2), "acme"),
            tx("pos_sale", dec!(200), at(2026, 3, 3), "globex"),
            tx("pos_sale", dec!(100), at(2026, 3, 4), "acme"),
            tx("invoice_paid", dec!(5000), at(2026, 3, 5), "acme"),
        ];

        let summary = engine().accrue(&ledger, date(2026, 3, 1), date(2026, 3, 31)).unwrap();
        assert_eq!(summary.participants.len(), 2);
        assert_eq!(summary.participants[0].participant_id, "acme");

        let acme = summary.get("acme").unwrap();
        // 50 + 5 + min(500, 100)
        assert_eq!(acme.raw_rvus, dec!(155));
        assert_eq!(acme.transaction_count, 3);
        assert!(acme.activity_types.contains("invoice_paid"));
        assert!(acme.activity_types.contains("pos_sale"));

        assert_eq!(summary.get("globex").unwrap().raw_rvus, dec!(10));
        assert_eq!(summary.skipped_total(), 0);
    }

    #[test]
    fn test_skip_reasons() {
        let ledger = vec![
            tx("invoice_paid", dec!(5), at(2026, 3, 2), "acme"),
            tx("payroll_run", dec!(900), at(2026, 3, 2), "acme"),
            tx("card_spend", dec!(900), at(2026, 3, 2), "acme"),
            tx("pos_sale", dec!(900), at(2026, 4, 1), "acme"),
        ];

        let summary = engine().accrue(&ledger, date(2026, 3, 1), date(2026, 3, 31)).unwrap();
        assert!(summary.participants.is_empty());
        assert_eq!(summary.skipped[&SkipReason::OutOfRange], 1);
        assert_eq!(summary.skipped[&SkipReason::Disabled], 1);
        assert_eq!(summary.skipped[&SkipReason::UnknownType], 1);
        assert_eq!(summary.skipped[&SkipReason::OutsidePeriod], 1);
    }

    #[test]
    fn test_period_bounds_inclusive() {
        let ledger = vec![
            tx("pos_sale", dec!(20), at(2026, 3, 1), "acme"),
            tx("pos_sale", dec!(20), at(2026, 3, 31), "acme"),
        ];
        let summary = engine().accrue(&ledger, date(2026, 3, 1), date(2026, 3, 31)).unwrap();
        assert_eq!(summary.get("acme").unwrap().raw_rvus, dec!(2));
    }

    #[test]
    fn test_inverted_period_rejected() {
        let err = engine().accrue(&[], date(2026, 3, 31), date(2026, 3, 1)).unwrap_err();
        assert!(matches!(err, RewardsError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_into_participants() {
        let ledger = vec![
            tx("pos_sale", dec!(200), at(2026, 3, 3), "globex"),
            tx("pos_sale", dec!(200), at(2026, 3, 3), "initech"),
        ];
        let summary = engine().accrue(&ledger, date(2026, 3, 1), date(2026, 3, 31)).unwrap();

        let mut memberships = HashMap::new();
        memberships.insert("globex".to_string(), Tier::Scale);
        let err = summary.clone().into_participants(&memberships).unwrap_err();
        assert_eq!(err, RewardsError::UnknownParticipant("initech".into()));

        memberships.insert("initech".to_string(), Tier::Starter);
        let participants = summary.into_participants(&memberships).unwrap();
        assert_eq!(participants[0].tier, Tier::Scale);
        assert_eq!(participants[1].raw_rvus, dec!(10));
        assert!(participants[1].activity_types.contains("pos_sale"));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let mut rules = BTreeMap::new();
        rules.insert(
            "bad".to_string(),
            TransactionTypeRule::new("bad", dec!(-1)),
        );
        assert!(TransactionAccrualEngine::new(rules).is_err());
    }

    #[test]
    fn test_rule_under_wrong_key_rejected() {
        let mut rules = BTreeMap::new();
        rules.insert(
            "invoice_paid".to_string(),
            TransactionTypeRule::new("pos_sale", dec!(0.05)),
        );
        let err = TransactionAccrualEngine::new(rules).unwrap_err();
        assert!(matches!(err, RewardsError::InvalidTransactionRule { .. }));
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
