use crate::core::holding::{AssetClass, Holding, LiquidityTier};
use crate::core::member::MemberId;
use crate::core::metrics::{AssetMetricsSource, NoMetrics};
use crate::core::portfolio::Portfolio;
use crate::core::questionnaire::UrgencyProfile;
use crate::optimization::scoring::{self, SellAssessment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// Why a holding was drawn from, in the order the reasons apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    /// The holding belongs to a member the questionnaire put first.
    PriorityMember,
    /// Drawn in liquidity order for its tier.
    Liquidity(LiquidityTier),
    /// Goal-linked holding, drawn only after everything else in its tier.
    GoalDeferred,
    /// Goal-linked holding drawn in plain liquidity order because the need is urgent.
    UrgencyOverride,
    /// The draw stopped at the recurring-need cap, leaving the rest invested.
    BufferPreserved,
}

impl Rationale {
    /// Human-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Rationale::PriorityMember => "priority member",
            Rationale::Liquidity(LiquidityTier::Instant) => "highest liquidity",
            Rationale::Liquidity(LiquidityTier::Medium) => "medium liquidity",
            Rationale::Liquidity(LiquidityTier::Variable) => "market-dependent liquidity",
            Rationale::GoalDeferred => "goal-preserving last resort",
            Rationale::UrgencyOverride => "urgent need overrides goal preservation",
            Rationale::BufferPreserved => "buffer preserved for recurring need",
        }
    }
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One withdrawal from one holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub member: MemberId,
    pub asset_class: AssetClass,
    pub asset_key: String,
    /// Amount to liquidate. Never exceeds `holding_value`.
    pub amount: Decimal,
    /// Value of the source holding when the plan was made.
    pub holding_value: Decimal,
    /// Reasons, primary first. Lines built by the optimizer always carry at
    /// least the liquidity tag.
    pub rationale: Vec<Rationale>,
    /// Metric-based sell score, when metrics were available for the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_assessment: Option<SellAssessment>,
}

impl AllocationLine {
    pub fn primary_rationale(&self) -> Option<Rationale> {
        self.rationale.first().copied()
    }

    /// Share of the source holding this line liquidates.
    pub fn fraction_of_holding(&self) -> Decimal {
        if self.holding_value.is_zero() {
            return Decimal::ZERO;
        }
        self.amount / self.holding_value
    }
}

/// Ordered liquidation decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationPlan {
    lines: Vec<AllocationLine>,
    amount_needed: Decimal,
    total_raised: Decimal,
    shortfall: Decimal,
}

impl LiquidationPlan {
    fn empty(amount_needed: Decimal) -> Self {
        Self {
            lines: Vec::new(),
            amount_needed,
            total_raised: Decimal::ZERO,
            shortfall: amount_needed.max(Decimal::ZERO),
        }
    }

    pub fn lines(&self) -> &[AllocationLine] {
        &self.lines
    }

    pub fn amount_needed(&self) -> Decimal {
        self.amount_needed
    }

    pub fn total_raised(&self) -> Decimal {
        self.total_raised
    }

    /// Part of the need the portfolio could not cover. Zero when fully funded.
    pub fn shortfall(&self) -> Decimal {
        self.shortfall
    }

    pub fn is_fully_funded(&self) -> bool {
        self.shortfall.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines drawn from one member's holdings, in plan order.
    pub fn lines_for<'a>(&'a self, member: &'a MemberId) -> impl Iterator<Item = &'a AllocationLine> {
        self.lines.iter().filter(move |l| &l.member == member)
    }

    /// Total drawn from one asset class.
    pub fn class_total(&self, class: AssetClass) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.asset_class == class)
            .map(|l| l.amount)
            .sum()
    }
}

impl fmt::Display for LiquidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Liquidation Plan ===")?;
        writeln!(f, "Amount Needed: {}", self.amount_needed)?;
        writeln!(f, "Total Raised:  {}", self.total_raised.round_dp(2))?;
        writeln!(f, "Shortfall:     {}", self.shortfall.round_dp(2))?;
        for (i, line) in self.lines.iter().enumerate() {
            let tags: Vec<&str> = line.rationale.iter().map(|r| r.tag()).collect();
            writeln!(
                f,
                "  {}. {} {} {}: {} ({})",
                i + 1,
                line.member,
                line.asset_class,
                line.asset_key,
                line.amount.round_dp(2),
                tags.join("; ")
            )?;
        }
        Ok(())
    }
}

/// A holding in liquidation order, with its sell assessment if scored.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub holding: &'a Holding,
    pub assessment: Option<SellAssessment>,
}

impl Candidate<'_> {
    fn sell_score(&self) -> u32 {
        self.assessment.as_ref().map_or(0, |a| a.score)
    }
}

/// The liquidation decision core.
///
/// A greedy, deterministic single pass over an explicitly ordered candidate
/// list. The preferences involved are soft and ordinal, not a single
/// objective, so fixed tie-breaks keep every decision auditable.
pub struct LiquidationOptimizer;

impl LiquidationOptimizer {
    /// Order holdings for liquidation.
    ///
    /// 1. Holdings of priority members first.
    /// 2. Within each bucket, by liquidity tier: bank, mutual fund, stock.
    /// 3. When goals are preserved and the need is not urgent, goal-linked
    ///    holdings go last within their tier.
    /// 4. Within what is left tied, higher sell scores first.
    ///
    /// The sort is stable, so remaining ties keep portfolio order.
    pub fn ranked_candidates<'a>(
        portfolio: &'a Portfolio,
        profile: &UrgencyProfile,
        metrics: &dyn AssetMetricsSource,
    ) -> Vec<Candidate<'a>> {
        let mut candidates: Vec<Candidate<'a>> = portfolio
            .holdings()
            .iter()
            .filter(|h| h.value() > Decimal::ZERO)
            .map(|holding| Candidate {
                holding,
                assessment: scoring::assess(holding, profile.purpose(), metrics),
            })
            .collect();
        candidates.sort_by_key(|c| {
            (
                !profile.is_priority(c.holding.member()),
                c.holding.liquidity_tier(),
                is_deferred(c.holding, profile),
                Reverse(c.sell_score()),
            )
        });
        candidates
    }

    /// Liquidation order without metrics: priority, liquidity and deferral only.
    pub fn candidate_order<'a>(portfolio: &'a Portfolio, profile: &UrgencyProfile) -> Vec<&'a Holding> {
        Self::ranked_candidates(portfolio, profile, &NoMetrics)
            .into_iter()
            .map(|c| c.holding)
            .collect()
    }

    /// Decide how much to draw from each holding to raise `amount_needed`,
    /// without asset metrics.
    pub fn optimize(
        portfolio: &Portfolio,
        profile: &UrgencyProfile,
        amount_needed: Decimal,
    ) -> LiquidationPlan {
        Self::optimize_with(portfolio, profile, amount_needed, &NoMetrics)
    }

    /// Decide how much to draw from each holding to raise `amount_needed`.
    ///
    /// # Algorithm
    ///
    /// 1. Order candidates with [`ranked_candidates`](Self::ranked_candidates).
    /// 2. Walk them, drawing `min(value * max_fraction, remaining)` from each.
    /// 3. Stop once the need is met or candidates run out.
    /// 4. Shortfall = max(0, need - raised).
    ///
    /// Always yields a plan; `total_raised + shortfall == amount_needed` for
    /// every non-negative need.
    pub fn optimize_with(
        portfolio: &Portfolio,
        profile: &UrgencyProfile,
        amount_needed: Decimal,
        metrics: &dyn AssetMetricsSource,
    ) -> LiquidationPlan {
        if amount_needed <= Decimal::ZERO {
            return LiquidationPlan::empty(amount_needed);
        }

        let max_fraction = profile.max_fraction();
        let mut remaining = amount_needed;
        let mut lines = Vec::new();

        for Candidate { holding, assessment } in Self::ranked_candidates(portfolio, profile, metrics) {
            if remaining <= Decimal::ZERO {
                break;
            }
            let cap = holding.value() * max_fraction;
            let amount = cap.min(remaining);
            if amount <= Decimal::ZERO {
                continue;
            }

            let capped = max_fraction < Decimal::ONE && cap < remaining;
            let rationale = rationale_for(holding, profile, capped);
            log::debug!(
                "draw {} from {} ({})",
                amount,
                holding,
                rationale.iter().map(|r| r.tag()).collect::<Vec<_>>().join("; ")
            );
            remaining -= amount;
            lines.push(AllocationLine {
                member: holding.member().clone(),
                asset_class: holding.asset_class(),
                asset_key: holding.asset_key().to_string(),
                amount,
                holding_value: holding.value(),
                rationale,
                sell_assessment: assessment,
            });
        }

        let total_raised = amount_needed - remaining;
        let shortfall = remaining.max(Decimal::ZERO);
        if shortfall > Decimal::ZERO {
            log::warn!(
                "portfolio covers {} of {}; shortfall {}",
                total_raised,
                amount_needed,
                shortfall
            );
        }
        log::info!(
            "liquidation plan: {} lines, raised {} of {}",
            lines.len(),
            total_raised,
            amount_needed
        );

        LiquidationPlan {
            lines,
            amount_needed,
            total_raised,
            shortfall,
        }
    }
}

fn is_goal_guarded(holding: &Holding, profile: &UrgencyProfile) -> bool {
    profile.preserves_goals() && holding.is_goal_linked()
}

fn is_deferred(holding: &Holding, profile: &UrgencyProfile) -> bool {
    is_goal_guarded(holding, profile) && !profile.is_urgent()
}

fn rationale_for(holding: &Holding, profile: &UrgencyProfile, capped: bool) -> Vec<Rationale> {
    let mut tags = Vec::with_capacity(3);
    if profile.is_priority(holding.member()) {
        tags.push(Rationale::PriorityMember);
    }
    tags.push(Rationale::Liquidity(holding.liquidity_tier()));
    if is_goal_guarded(holding, profile) {
        if profile.is_urgent() {
            tags.push(Rationale::UrgencyOverride);
        } else {
            tags.push(Rationale::GoalDeferred);
        }
    }
    if profile.is_recurring() && capped {
        tags.push(Rationale::BufferPreserved);
    }
    tags
}
