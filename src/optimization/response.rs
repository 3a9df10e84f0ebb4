use crate::config::EngineConfig;
use crate::core::holding::{AssetClass, Holding};
use crate::core::member::MemberId;
use crate::core::metrics::AssetMetricsSource;
use crate::core::portfolio::Portfolio;
use crate::core::questionnaire::{IncomeChange, Purpose, UrgencyProfile};
use crate::optimization::optimizer::{AllocationLine, LiquidationPlan};
use crate::optimization::scoring;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// One allocation as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub member: MemberId,
    pub asset_type: AssetClass,
    pub asset_key: String,
    pub amount: Decimal,
    /// Rationale tags joined with "; ", primary tag first.
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_score: Option<u32>,
    /// Weak metric signals behind the sell score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_reason: Option<String>,
}

impl From<&AllocationLine> for AllocationEntry {
    fn from(line: &AllocationLine) -> Self {
        let tags: Vec<&str> = line.rationale.iter().map(|r| r.tag()).collect();
        Self {
            member: line.member.clone(),
            asset_type: line.asset_class,
            asset_key: line.asset_key.clone(),
            amount: line.amount,
            rationale: tags.join("; "),
            sell_score: line.sell_assessment.as_ref().map(|a| a.score),
            sell_reason: line.sell_assessment.as_ref().map(|a| a.reason()),
        }
    }
}

/// A weak holding worth switching out of, independent of the current need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySuggestion {
    pub member: MemberId,
    pub asset_type: AssetClass,
    pub asset_key: String,
    /// Value left in the holding after this plan executes.
    pub remaining_value: Decimal,
    pub sell_score: u32,
    pub reason: String,
    pub recommendation: String,
}

/// Response payload for a liquidation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Allocations in the order they should be executed.
    pub allocations: Vec<AllocationEntry>,
    pub amount_needed: Decimal,
    pub total_raised: Decimal,
    pub shortfall: Decimal,
    pub total_portfolio_value: Decimal,
    /// Requested amount as a percentage of the portfolio. `None` for an
    /// empty portfolio.
    pub liquidation_percentage: Option<f64>,
    /// Amount raised per member.
    pub member_totals: BTreeMap<MemberId, Decimal>,
    pub recommendations: Vec<String>,
    /// Poorly scoring holdings to consider switching out of. Empty without
    /// metrics.
    #[serde(default)]
    pub secondary_suggestions: Vec<SecondarySuggestion>,
}

impl LiquidationResponse {
    /// Build the response for a finished plan. The plan is only read.
    pub fn from_plan(
        plan: &LiquidationPlan,
        portfolio: &Portfolio,
        profile: &UrgencyProfile,
        config: &EngineConfig,
        metrics: &dyn AssetMetricsSource,
    ) -> Self {
        let mut member_totals: BTreeMap<MemberId, Decimal> = BTreeMap::new();
        for line in plan.lines() {
            *member_totals
                .entry(line.member.clone())
                .or_insert(Decimal::ZERO) += line.amount;
        }

        let total_value = portfolio.total_value();
        let pct = requested_percent(plan.amount_needed(), total_value);

        LiquidationResponse {
            request_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            allocations: plan.lines().iter().map(AllocationEntry::from).collect(),
            amount_needed: plan.amount_needed(),
            total_raised: plan.total_raised(),
            shortfall: plan.shortfall(),
            total_portfolio_value: total_value,
            liquidation_percentage: pct.and_then(|p| p.round_dp(2).to_f64()),
            member_totals,
            recommendations: recommendations(plan, portfolio, profile, config),
            secondary_suggestions: secondary_suggestions(plan, portfolio, config, metrics),
        }
    }

    pub fn is_fully_funded(&self) -> bool {
        self.shortfall.is_zero()
    }
}

impl fmt::Display for LiquidationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Liquidation Recommendation ===")?;
        writeln!(f, "Amount Needed:   {}", self.amount_needed)?;
        writeln!(f, "Portfolio Value: {}", self.total_portfolio_value.round_dp(2))?;
        if let Some(pct) = self.liquidation_percentage {
            writeln!(f, "Share Requested: {:.1}%", pct)?;
        }
        writeln!(f, "Total Raised:    {}", self.total_raised.round_dp(2))?;
        writeln!(f, "Shortfall:       {}", self.shortfall.round_dp(2))?;

        writeln!(f, "\nAllocations:")?;
        if self.allocations.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (i, entry) in self.allocations.iter().enumerate() {
            writeln!(
                f,
                "  {}. {:<10} {:<12} {:<16} {:>14}  [{}]",
                i + 1,
                entry.member.as_str(),
                entry.asset_type.as_str(),
                entry.asset_key,
                entry.amount.round_dp(2).to_string(),
                entry.rationale
            )?;
        }

        if !self.member_totals.is_empty() {
            writeln!(f, "\nPer Member:")?;
            for (member, amount) in &self.member_totals {
                writeln!(f, "  {}: {}", member, amount.round_dp(2))?;
            }
        }

        if !self.recommendations.is_empty() {
            writeln!(f, "\nRecommendations:")?;
            for rec in &self.recommendations {
                writeln!(f, "  - {}", rec)?;
            }
        }

        if !self.secondary_suggestions.is_empty() {
            writeln!(f, "\nAlso Consider Switching:")?;
            for s in &self.secondary_suggestions {
                writeln!(
                    f,
                    "  - {} {} {} ({} left, score {}): {}. {}",
                    s.member,
                    s.asset_type,
                    s.asset_key,
                    s.remaining_value.round_dp(2),
                    s.sell_score,
                    s.reason,
                    s.recommendation
                )?;
            }
        }
        Ok(())
    }
}

/// `None` for an empty portfolio or when the percentage is not representable.
fn requested_percent(amount_needed: Decimal, total_value: Decimal) -> Option<Decimal> {
    if total_value.is_zero() {
        return None;
    }
    amount_needed
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(total_value)
}

fn drawn_from(plan: &LiquidationPlan, holding: &Holding) -> Decimal {
    plan.lines_for(holding.member())
        .filter(|l| l.asset_class == holding.asset_class() && l.asset_key == holding.asset_key())
        .map(|l| l.amount)
        .sum()
}

/// Non-goal-linked holdings whose need-independent sell score passes the
/// configured threshold, with what the plan leaves in them.
pub fn secondary_suggestions(
    plan: &LiquidationPlan,
    portfolio: &Portfolio,
    config: &EngineConfig,
    metrics: &dyn AssetMetricsSource,
) -> Vec<SecondarySuggestion> {
    let mut out = Vec::new();
    for holding in portfolio.holdings() {
        if holding.is_goal_linked() {
            continue;
        }
        let (threshold, recommendation) = match holding.asset_class() {
            AssetClass::BankBalance => continue,
            AssetClass::Stock => (
                config.poor_stock_score,
                "Consider switching to fundamentally stronger stocks",
            ),
            AssetClass::MutualFund => (
                config.poor_fund_score,
                "Consider switching to better performing funds with lower costs",
            ),
        };
        let Some(assessment) = scoring::assess(holding, Purpose::Other, metrics) else {
            continue;
        };
        if assessment.score <= threshold {
            continue;
        }
        let remaining_value = holding.value() - drawn_from(plan, holding);
        if remaining_value <= Decimal::ZERO {
            continue;
        }
        out.push(SecondarySuggestion {
            member: holding.member().clone(),
            asset_type: holding.asset_class(),
            asset_key: holding.asset_key().to_string(),
            remaining_value,
            sell_score: assessment.score,
            reason: assessment.reason(),
            recommendation: recommendation.to_string(),
        });
    }
    out
}

/// Advisory notes that accompany the plan. They never change it.
pub fn recommendations(
    plan: &LiquidationPlan,
    portfolio: &Portfolio,
    profile: &UrgencyProfile,
    config: &EngineConfig,
) -> Vec<String> {
    let mut notes = Vec::new();
    if plan.amount_needed().is_zero() {
        return notes;
    }

    if let Some(pct) = requested_percent(plan.amount_needed(), portfolio.total_value()) {
        if pct > config.critical_liquidation_percent {
            notes.push(format!(
                "Request is {:.1}% of total net worth, above the {}% stability limit; consider a loan or a smaller amount",
                pct,
                config.critical_liquidation_percent
            ));
        } else if pct > config.high_liquidation_percent {
            notes.push(
                "High liquidation percentage; consider exploring loan options to preserve investments"
                    .to_string(),
            );
        } else if pct > config.moderate_liquidation_percent {
            notes.push(
                "Moderate liquidation; review whether the full amount is necessary".to_string(),
            );
        }
    }

    if !plan.is_fully_funded() {
        notes.push(format!(
            "Portfolio can raise only {} of {}; the remaining {} must come from other sources",
            plan.total_raised().round_dp(2),
            plan.amount_needed(),
            plan.shortfall().round_dp(2)
        ));
    }

    if profile.purpose() == Purpose::Emergency {
        notes.push(
            "Build a larger emergency fund (6-12 months of expenses) to avoid future liquidations"
                .to_string(),
        );
    }
    if profile.timeline().is_immediate() {
        notes.push("Maintain higher liquid funds for urgent needs".to_string());
    }
    if profile.preserves_goals() {
        notes.push(
            "Review and rebalance the remaining portfolio to stay on track with financial goals"
                .to_string(),
        );
    }
    if profile.income_change() == IncomeChange::WillReduce {
        notes.push(
            "Consider creating additional passive income sources before income reduces"
                .to_string(),
        );
    }
    if profile.is_recurring() {
        let kept = (Decimal::ONE - profile.max_fraction()) * Decimal::ONE_HUNDRED;
        notes.push(format!(
            "At least {}% of every drawn holding stays invested so future withdrawals remain possible",
            kept.normalize()
        ));
    }

    let remaining_total = portfolio.total_value() - plan.total_raised();
    if remaining_total > Decimal::ZERO {
        let remaining_bank =
            portfolio.class_value(AssetClass::BankBalance) - plan.class_total(AssetClass::BankBalance);
        let target = profile.bank_reserve_target();
        let share = remaining_bank / remaining_total;
        if share < target {
            notes.push(format!(
                "Bank balance after liquidation is {:.1}% of the remaining portfolio, below the {}% reserve suggested for this purpose",
                share * Decimal::ONE_HUNDRED,
                (target * Decimal::ONE_HUNDRED).normalize()
            ));
        }
    }

    let sells_market_assets = plan
        .lines()
        .iter()
        .any(|l| l.asset_class != AssetClass::BankBalance);
    if sells_market_assets {
        notes.push(
            "Consult a tax advisor about capital gains on the mutual fund and stock sales".to_string(),
        );
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::{FundMetrics, MetricsTable, NoMetrics, StockMetrics};
    use crate::core::portfolio::BANK_ASSET_KEY;
    use crate::core::questionnaire::{HasGoals, Questionnaire, RecurringNeed, Timeline};
    use crate::optimization::optimizer::LiquidationOptimizer;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn respond_with(
        portfolio: &Portfolio,
        q: Questionnaire,
        metrics: &dyn AssetMetricsSource,
    ) -> LiquidationResponse {
        let config = EngineConfig::default();
        let profile = q.profile(&config);
        let plan = LiquidationOptimizer::optimize_with(portfolio, &profile, q.amount_needed(), metrics);
        LiquidationResponse::from_plan(&plan, portfolio, &profile, &config, metrics)
    }

    fn respond(portfolio: &Portfolio, q: Questionnaire) -> LiquidationResponse {
        respond_with(portfolio, q, &NoMetrics)
    }

    fn weak_fund() -> FundMetrics {
        FundMetrics {
            cagr_3y: 7.0,
            expense_ratio: 2.5,
            ..Default::default()
        }
    }

    fn family() -> Portfolio {
        vec![
            Holding::new(MemberId::new("A"), AssetClass::BankBalance, BANK_ASSET_KEY, dec!(2_000)),
            Holding::new(MemberId::new("B"), AssetClass::MutualFund, "AXIS_BLUECHIP", dec!(8_000)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_entries_mirror_plan() {
        let response = respond(&family(), Questionnaire::new(dec!(3_000)).with_priority_member("B"));
        assert_eq!(response.allocations.len(), 1);
        let entry = &response.allocations[0];
        assert_eq!(entry.member, MemberId::new("B"));
        assert_eq!(entry.asset_type, AssetClass::MutualFund);
        assert_eq!(entry.amount, dec!(3_000));
        assert_eq!(entry.rationale, "priority member; medium liquidity");
        assert_eq!(response.member_totals[&MemberId::new("B")], dec!(3_000));
        assert_relative_eq!(response.liquidation_percentage.unwrap(), 30.0);
    }

    #[test]
    fn test_empty_portfolio_has_no_percentage() {
        let response = respond(&Portfolio::new(), Questionnaire::new(dec!(100)));
        assert!(response.liquidation_percentage.is_none());
        assert_eq!(response.shortfall, dec!(100));
        assert!(response
            .recommendations
            .iter()
            .any(|r| r.contains("must come from other sources")));
    }

    #[test]
    fn test_zero_need_has_no_recommendations() {
        let response = respond(&family(), Questionnaire::new(Decimal::ZERO));
        assert!(response.allocations.is_empty());
        assert!(response.recommendations.is_empty());
        assert!(response.is_fully_funded());
    }

    #[test]
    fn test_liquidation_warnings_by_threshold() {
        let critical = respond(&family(), Questionnaire::new(dec!(9_000)));
        assert!(critical.recommendations[0].contains("stability limit"));

        let high = respond(&family(), Questionnaire::new(dec!(6_000)));
        assert!(high.recommendations[0].starts_with("High liquidation"));

        let moderate = respond(&family(), Questionnaire::new(dec!(4_000)));
        assert!(moderate.recommendations[0].starts_with("Moderate liquidation"));

        let small = respond(&family(), Questionnaire::new(dec!(100)));
        assert!(!small
            .recommendations
            .iter()
            .any(|r| r.contains("liquidation") && r.contains("%")));
    }

    #[test]
    fn test_profile_driven_advice() {
        let response = respond(
            &family(),
            Questionnaire::new(dec!(500))
                .with_timeline(Timeline::Today)
                .with_has_goals(HasGoals::Yes)
                .with_recurring_need(RecurringNeed::Recurring),
        );
        let all = response.recommendations.join("\n");
        assert!(all.contains("Maintain higher liquid funds"));
        assert!(all.contains("financial goals"));
        assert!(all.contains("At least 30% of every drawn holding"));
    }

    #[test]
    fn test_bank_reserve_notice() {
        // Drawing the whole bank balance leaves 0% in cash.
        let response = respond(&family(), Questionnaire::new(dec!(2_000)));
        assert!(response
            .recommendations
            .iter()
            .any(|r| r.contains("below the 8% reserve")));
    }

    #[test]
    fn test_requested_percent_out_of_range_is_none() {
        assert_eq!(requested_percent(Decimal::MAX, dec!(1)), None);
        assert_eq!(requested_percent(dec!(50), Decimal::ZERO), None);
        assert_eq!(requested_percent(dec!(50), dec!(200)), Some(dec!(25)));
    }

    #[test]
    fn test_huge_portfolio_reserve_notice_does_not_overflow() {
        // Bank is about 5% of a portfolio near the largest representable value.
        let bank = Decimal::MAX / dec!(20);
        let fund = Decimal::MAX - Decimal::MAX / dec!(10);
        let portfolio: Portfolio = vec![
            Holding::new(MemberId::new("A"), AssetClass::BankBalance, BANK_ASSET_KEY, bank),
            Holding::new(MemberId::new("A"), AssetClass::MutualFund, "AXIS_BLUECHIP", fund),
        ]
        .into_iter()
        .collect();
        let response = respond(&portfolio, Questionnaire::new(dec!(5)));
        assert!(response
            .recommendations
            .iter()
            .any(|r| r.contains("below the 8% reserve")));
    }

    #[test]
    fn test_entries_carry_sell_assessment() {
        let metrics = MetricsTable::new().with_fund("AXIS_BLUECHIP", weak_fund());
        let response = respond_with(&family(), Questionnaire::new(dec!(3_000)), &metrics);
        let fund_entry = &response.allocations[1];
        assert_eq!(fund_entry.asset_key, "AXIS_BLUECHIP");
        assert_eq!(fund_entry.sell_score, Some(25 + 20 + 5));
        assert_eq!(
            fund_entry.sell_reason.as_deref(),
            Some("Poor 3Y CAGR; High expense ratio")
        );
        assert_eq!(response.allocations[0].sell_score, None);

        let json = serde_json::to_value(&response.allocations[0]).unwrap();
        assert!(json.get("sell_score").is_none());
    }

    #[test]
    fn test_secondary_suggestions_report_what_remains() {
        let portfolio: Portfolio = vec![
            Holding::new(MemberId::new("A"), AssetClass::BankBalance, BANK_ASSET_KEY, dec!(2_000)),
            Holding::new(MemberId::new("B"), AssetClass::MutualFund, "AXIS_BLUECHIP", dec!(8_000)),
            Holding::new(MemberId::new("B"), AssetClass::MutualFund, "HDFC_DEBT", dec!(4_000))
                .with_goal_link(true),
            Holding::priced(MemberId::new("B"), "YESBANK", dec!(100), dec!(20)).unwrap(),
            Holding::priced(MemberId::new("B"), "TCS", dec!(1), dec!(3_500)).unwrap(),
        ]
        .into_iter()
        .collect();
        let metrics = MetricsTable::new()
            .with_fund("AXIS_BLUECHIP", weak_fund())
            .with_fund("HDFC_DEBT", weak_fund())
            .with_stock(
                "YESBANK",
                StockMetrics {
                    pledged_promoter_holdings: 30.0,
                    free_cash_flow: -10.0,
                    months_held: 24,
                    ..Default::default()
                },
            )
            .with_stock("TCS", StockMetrics::default());

        let response = respond_with(&portfolio, Questionnaire::new(dec!(5_000)), &metrics);
        let found: Vec<(&str, Decimal)> = response
            .secondary_suggestions
            .iter()
            .map(|s| (s.asset_key.as_str(), s.remaining_value))
            .collect();
        // Goal-linked HDFC_DEBT and the neutral TCS are left alone.
        assert_eq!(found, vec![("AXIS_BLUECHIP", dec!(5_000)), ("YESBANK", dec!(2_000))]);
        assert_eq!(response.secondary_suggestions[1].sell_score, 50);
        assert_eq!(
            response.secondary_suggestions[1].reason,
            "High pledged holdings; Negative free cash flow"
        );
        assert!(response.secondary_suggestions[0]
            .recommendation
            .contains("lower costs"));
        assert!(response.to_string().contains("Also Consider Switching"));
    }

    #[test]
    fn test_fully_drawn_holding_not_suggested() {
        let metrics = MetricsTable::new().with_fund("AXIS_BLUECHIP", weak_fund());
        let response = respond_with(&family(), Questionnaire::new(dec!(10_000)), &metrics);
        assert!(response.secondary_suggestions.is_empty());
    }

    #[test]
    fn test_no_suggestions_without_metrics() {
        let response = respond(&family(), Questionnaire::new(dec!(500)));
        assert!(response.secondary_suggestions.is_empty());
        assert!(!response.to_string().contains("Also Consider Switching"));
    }

    #[test]
    fn test_display_lists_allocations() {
        let response = respond(&family(), Questionnaire::new(dec!(2_500)));
        let text = response.to_string();
        assert!(text.contains("Liquidation Recommendation"));
        assert!(text.contains("AXIS_BLUECHIP"));
        assert!(text.contains("highest liquidity"));
    }

    #[test]
    fn test_response_serializes_expected_fields() {
        let response = respond(&family(), Questionnaire::new(dec!(500)));
        let json: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert!(json.get("allocations").is_some());
        assert!(json.get("total_raised").is_some());
        assert!(json.get("shortfall").is_some());
        assert_eq!(json["allocations"][0]["asset_type"], "bank_balance");
    }
}
