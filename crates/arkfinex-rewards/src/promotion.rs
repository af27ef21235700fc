//! Promotional bonus windows

use crate::error::{Result, RewardsError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time-bounded bonus multiplier on selected transaction types
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionWindow {
    #[serde(default)]
    pub enabled: bool,

    /// Multiplier applied to qualifying participants (>= 1.0)
    pub bonus_multiplier: Decimal,

    /// First day of the window (inclusive)
    pub start_date: NaiveDate,

    /// Last day of the window (inclusive)
    pub end_date: NaiveDate,

    /// Transaction types that earn the bonus
    #[serde(default)]
    pub applicable_types: BTreeSet<String>,

    /// Per-participant ceiling on the bonus currency value
    pub max_bonus_cap: Decimal,
}

impl PromotionWindow {
    /// Whether the promotion is enabled and overlaps `[start, end]`
    pub fn applies_to_period(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.enabled && start <= self.end_date && self.start_date <= end
    }

    /// Whether any of `activity_types` earns the bonus
    pub fn covers_any<'a, I>(&self, activity_types: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        activity_types
            .into_iter()
            .any(|t| self.applicable_types.contains(t))
    }

    /// Validate the window. Disabled windows are checked too.
    pub fn validate(&self) -> Result<()> {
        if self.bonus_multiplier < Decimal::ONE {
            return Err(RewardsError::InvalidPromotion(format!(
                "bonusMultiplier must be at least 1.0, got {}",
                self.bonus_multiplier
            )));
        }
        if self.end_date < self.start_date {
            return Err(RewardsError::InvalidPromotion(format!(
                "endDate {} is before startDate {}",
                self.end_date, self.start_date
            )));
        }
        if self.max_bonus_cap < Decimal::ZERO {
            return Err(RewardsError::InvalidPromotion(format!(
                "maxBonusCap is negative: {}",
                self.max_bonus_cap
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn q1_promo() -> PromotionWindow {
        PromotionWindow {
            enabled: true,
            bonus_multiplier: dec!(1.5),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 3, 31),
            applicable_types: ["invoice_paid".to_string()].into_iter().collect(),
            max_bonus_cap: dec!(1000),
        }
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let promo = q1_promo();
        assert!(promo.applies_to_period(date(2026, 3, 31), date(2026, 4, 30)));
        assert!(promo.applies_to_period(date(2025, 12, 1), date(2026, 1, 1)));
        assert!(!promo.applies_to_period(date(2026, 4, 1), date(2026, 4, 30)));
        assert!(!promo.applies_to_period(date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn test_disabled_never_applies() {
        let promo = PromotionWindow {
            enabled: false,
            ..q1_promo()
        };
        assert!(!promo.applies_to_period(date(2026, 2, 1), date(2026, 2, 28)));
    }

    #[test]
    fn test_covers_any() {
        let promo = q1_promo();
        let types = vec!["pos_sale".to_string(), "invoice_paid".to_string()];
        assert!(promo.covers_any(&types));
        assert!(!promo.covers_any(&vec!["pos_sale".to_string()]));
    }

    #[test]
    fn test_validate() {
        assert!(q1_promo().validate().is_ok());

        let bad = PromotionWindow {
            bonus_multiplier: dec!(0.8),
            ..q1_promo()
        };
        assert!(matches!(bad.validate(), Err(RewardsError::InvalidPromotion(_))));

        let inverted = PromotionWindow {
            start_date: date(2026, 4, 1),
            ..q1_promo()
        };
        assert!(inverted.validate().is_err());
    }
}
