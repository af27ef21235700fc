//! # Reward Pool Allocation
//!
//! Splits a period's pool across participants in proportion to their
//! tier-adjusted RVUs.
//!
//! ## Pipeline
//!
//! 1. **Tier adjustment**: `adjusted = raw * tier.multiplier`
//! 2. **Promotion bonus**: qualifying participants earn
//!    `adjusted * (bonus_multiplier - 1)` extra RVUs, cut back so their
//!    currency value never exceeds `max_bonus_cap`
//! 3. **Eligibility**: `adjusted < min_rvu_for_payout` drops the participant
//! 4. **Share**: `adjusted / sum(eligible adjusted)`
//! 5. **Raw payout**: `share * pool_amount`
//! 6. **Cap**: `min(raw, max_payout_percent% of pool_amount)`
//!
//! Whatever capping leaves behind is the residual. It is reported, never
//! redistributed.
//!
//! Every share depends on the whole eligible set, so the set is fully
//! materialised before the first share is computed.

use crate::config::RewardsConfig;
use crate::error::{Result, RewardsError};
use crate::pool::{Participant, PoolPolicy, RewardPool};
use crate::promotion::PromotionWindow;
use crate::tiers::TierRules;
use crate::{round_currency, round_rvus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allocation for one eligible participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub participant_id: String,

    /// RVUs after tier multiplier and promotion bonus
    #[serde(rename = "adjustedRVUs")]
    pub adjusted_rvus: Decimal,

    /// Fraction of the pool, in [0, 1]
    pub share_of_pool: Decimal,

    /// Proportional payout before the per-participant cap
    pub raw_payout: Decimal,

    /// Payout after the per-participant cap
    pub capped_payout: Decimal,

    /// Promotion bonus RVUs kept after the bonus cap
    #[serde(rename = "bonusRVUs", default)]
    pub bonus_rvus: Decimal,

    /// Currency value of the bonus RVUs, at most the promotion's cap
    #[serde(default)]
    pub bonus_value: Decimal,
}

/// Allocation results plus the undistributed residual
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub period_id: String,

    pub results: Vec<AllocationResult>,

    /// `pool_amount - sum(capped_payout)`
    pub residual: Decimal,

    /// Denominator used for every share
    #[serde(rename = "totalAdjustedRVUs")]
    pub total_adjusted_rvus: Decimal,

    /// Participants dropped by the payout threshold
    #[serde(default)]
    pub excluded: Vec<String>,
}

/// Pool currency left undistributed after capping
pub fn residual(pool: &RewardPool, results: &[AllocationResult]) -> Decimal {
    let distributed: Decimal = results.iter().map(|r| r.capped_payout).sum();
    pool.pool_amount - distributed
}

/// Allocate `pool` across its participants.
///
/// Pure: reads its inputs and returns a new list. Either every result is
/// produced or an error is returned before any.
///
/// # Errors
///
/// - [`RewardsError::MissingTierRule`] if a participant's tier is not configured
/// - [`RewardsError::NonPositivePoolAmount`] if `pool_amount <= 0`
/// - [`RewardsError::InvalidPeriod`] if the period ends before it starts
/// - [`RewardsError::NegativeRvus`] for a negative raw balance
/// - [`RewardsError::PercentOutOfRange`] for policy or tier percentages outside [0, 100]
pub fn allocate(
    pool: &RewardPool,
    tier_rules: &TierRules,
    promotion: Option<&PromotionWindow>,
    policy: &PoolPolicy,
) -> Result<Vec<AllocationResult>> {
    build_report(pool, tier_rules, promotion, policy).map(|report| report.results)
}

/// Allocate `pool` and return the full report
pub fn build_report(
    pool: &RewardPool,
    tier_rules: &TierRules,
    promotion: Option<&PromotionWindow>,
    policy: &PoolPolicy,
) -> Result<AllocationReport> {
    pool.validate()?;
    policy.validate()?;
    tier_rules.validate()?;
    if let Some(promo) = promotion {
        promo.validate()?;
    }

    let mut working = tier_adjust(&pool.participants, tier_rules)?;

    let active_promotion =
        promotion.filter(|p| p.applies_to_period(pool.period_start, pool.period_end));
    if let Some(promo) = active_promotion {
        apply_promotion(&mut working, promo, pool.pool_amount)?;
    }

    let threshold = policy.min_rvus();
    let (eligible, dropped): (Vec<_>, Vec<_>) = working
        .into_iter()
        .partition(|w| w.adjusted() >= threshold);

    let excluded: Vec<String> = dropped
        .iter()
        .map(|w| {
            tracing::debug!(
                participant = %w.participant.participant_id,
                adjusted = %w.adjusted(),
                threshold = policy.min_rvu_for_payout,
                "excluded below payout threshold"
            );
            w.participant.participant_id.clone()
        })
        .collect();

    let total = eligible
        .iter()
        .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(w.adjusted()))
        .ok_or(RewardsError::ArithmeticOverflow("total adjusted RVUs"))?;

    let cap = round_currency(
        policy
            .max_payout_percent
            .checked_mul(pool.pool_amount)
            .ok_or(RewardsError::ArithmeticOverflow("payout cap"))?
            / Decimal::ONE_HUNDRED,
    );

    let mut results = Vec::with_capacity(eligible.len());
    for w in &eligible {
        results.push(allocate_one(w, total, pool.pool_amount, cap)?);
    }

    let residual = residual(pool, &results);

    tracing::info!(
        period = %pool.period_id,
        participants = pool.participants.len(),
        eligible = results.len(),
        excluded = excluded.len(),
        total_adjusted = %total,
        residual = %residual,
        promotion = active_promotion.is_some(),
        "reward pool allocated"
    );

    Ok(AllocationReport {
        period_id: pool.period_id.clone(),
        results,
        residual,
        total_adjusted_rvus: total,
        excluded,
    })
}

/// Participant state between pipeline steps
struct Working<'a> {
    participant: &'a Participant,
    base: Decimal,
    bonus: Decimal,
    bonus_value: Decimal,
}

impl Working<'_> {
    fn adjusted(&self) -> Decimal {
        self.base + self.bonus
    }
}

fn tier_adjust<'a>(participants: &'a [Participant], tier_rules: &TierRules) -> Result<Vec<Working<'a>>> {
    participants
        .iter()
        .map(|participant| {
            let rule = tier_rules.get(participant.tier)?;
            let base = participant
                .raw_rvus
                .checked_mul(rule.multiplier)
                .ok_or(RewardsError::ArithmeticOverflow("tier adjustment"))?;
            Ok(Working {
                participant,
                base: round_rvus(base),
                bonus: Decimal::ZERO,
                bonus_value: Decimal::ZERO,
            })
        })
        .collect()
}

/// Grant promotion bonuses and enforce the per-participant bonus cap.
///
/// Bonus value is priced against the provisional total: every participant's
/// tier-adjusted RVUs plus every uncapped bonus. RVUs above the cap are dropped.
fn apply_promotion(working: &mut [Working<'_>], promo: &PromotionWindow, pool_amount: Decimal) -> Result<()> {
    let extra = promo.bonus_multiplier - Decimal::ONE;
    for w in working.iter_mut() {
        if promo.covers_any(&w.participant.activity_types) {
            let bonus = w
                .base
                .checked_mul(extra)
                .ok_or(RewardsError::ArithmeticOverflow("promotion bonus"))?;
            w.bonus = round_rvus(bonus);
        }
    }

    let provisional_total = working
        .iter()
        .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(w.adjusted()))
        .ok_or(RewardsError::ArithmeticOverflow("provisional total"))?;
    if provisional_total.is_zero() {
        return Ok(());
    }

    for w in working.iter_mut().filter(|w| !w.bonus.is_zero()) {
        let value = w
            .bonus
            .checked_mul(pool_amount)
            .ok_or(RewardsError::ArithmeticOverflow("bonus value"))?
            / provisional_total;

        if value > promo.max_bonus_cap {
            let kept = promo
                .max_bonus_cap
                .checked_mul(provisional_total)
                .and_then(|v| v.checked_div(pool_amount))
                .ok_or(RewardsError::ArithmeticOverflow("bonus cap"))?;
            tracing::debug!(
                participant = %w.participant.participant_id,
                uncapped = %round_currency(value),
                cap = %promo.max_bonus_cap,
                "promotion bonus capped"
            );
            w.bonus = round_rvus(kept);
            w.bonus_value = promo.max_bonus_cap;
        } else {
            w.bonus_value = round_currency(value);
        }
    }
    Ok(())
}

fn allocate_one(w: &Working<'_>, total: Decimal, pool_amount: Decimal, cap: Decimal) -> Result<AllocationResult> {
    let adjusted = w.adjusted();
    let (share_of_pool, raw_payout) = if total.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let scaled = adjusted
            .checked_mul(pool_amount)
            .ok_or(RewardsError::ArithmeticOverflow("raw payout"))?;
        (adjusted / total, round_currency(scaled / total))
    };

    Ok(AllocationResult {
        participant_id: w.participant.participant_id.clone(),
        adjusted_rvus: adjusted,
        share_of_pool,
        raw_payout,
        capped_payout: raw_payout.min(cap),
        bonus_rvus: w.bonus,
        bonus_value: w.bonus_value,
    })
}

/// Stateless allocator bound to one configuration
#[derive(Clone, Debug)]
pub struct RewardPoolAllocator {
    tier_rules: TierRules,
    promotion: Option<PromotionWindow>,
    policy: PoolPolicy,
}

impl RewardPoolAllocator {
    /// Create a new allocator
    pub fn new(tier_rules: TierRules, promotion: Option<PromotionWindow>, policy: PoolPolicy) -> Self {
        Self {
            tier_rules,
            promotion,
            policy,
        }
    }

    /// Build from a rewards configuration
    pub fn from_config(config: &RewardsConfig) -> Self {
        Self::new(config.tiers.clone(), config.promotion.clone(), config.pool.clone())
    }

    /// Allocate a pool
    pub fn allocate(&self, pool: &RewardPool) -> Result<Vec<AllocationResult>> {
        allocate(pool, &self.tier_rules, self.promotion.as_ref(), &self.policy)
    }

    /// Allocate a pool and report the residual
    pub fn report(&self, pool: &RewardPool) -> Result<AllocationReport> {
        build_report(pool, &self.tier_rules, self.promotion.as_ref(), &self.policy)
    }

    /// Tier table in use
    pub fn tier_rules(&self) -> &TierRules {
        &self.tier_rules
    }

    /// Pool policy in use
    pub fn policy(&self) -> &PoolPolicy {
        &self.policy
    }
}
