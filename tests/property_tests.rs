use liquidation_engine::config::EngineConfig;
use liquidation_engine::core::holding::{AssetClass, Holding};
use liquidation_engine::core::member::MemberId;
use liquidation_engine::core::metrics::{FundMetrics, MetricsTable, RiskCategory, StockMetrics};
use liquidation_engine::core::portfolio::Portfolio;
use liquidation_engine::core::questionnaire::{
    HasGoals, IncomeChange, Purpose, Questionnaire, RecurringNeed, Timeline,
};
use liquidation_engine::optimization::optimizer::LiquidationOptimizer;
use proptest::prelude::*;
use rust_decimal::Decimal;

const MEMBERS: &[&str] = &["A", "B", "C", "D"];

/// Generate a random member from a small pool (so members hold several assets).
fn arb_member() -> impl Strategy<Value = MemberId> {
    prop::sample::select(MEMBERS.to_vec()).prop_map(MemberId::from)
}

/// Generate a random money amount (0.00 to 1,000,000.00).
fn arb_value() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a random holding of any class.
fn arb_holding() -> impl Strategy<Value = Holding> {
    (
        arb_member(),
        prop::sample::select(vec![
            AssetClass::BankBalance,
            AssetClass::MutualFund,
            AssetClass::Stock,
        ]),
        prop::sample::select(vec!["HDFC_DEBT", "AXIS_BLUECHIP", "TCS", "INFY"]),
        arb_value(),
        any::<bool>(),
    )
        .prop_map(|(member, class, key, value, goal_linked)| {
            let key = if class == AssetClass::BankBalance { "bank" } else { key };
            Holding::new(member, class, key, value).with_goal_link(goal_linked)
        })
}

/// Generate a portfolio of 0..30 holdings.
fn arb_portfolio() -> impl Strategy<Value = Portfolio> {
    prop::collection::vec(arb_holding(), 0..30)
        .prop_map(|holdings| holdings.into_iter().collect::<Portfolio>())
}

/// Generate metrics for every asset key the holdings strategy can produce.
fn arb_metrics() -> impl Strategy<Value = MetricsTable> {
    let stock = (0.0f64..90.0, 10.0f64..90.0, -2_000.0f64..5_000.0, 0u32..36).prop_map(
        |(pe_ratio, rsi_14d, free_cash_flow, months_held)| StockMetrics {
            pe_ratio,
            rsi_14d,
            free_cash_flow,
            months_held,
            ..Default::default()
        },
    );
    let fund = (
        0.0f64..25.0,
        0.1f64..3.0,
        -5.0f64..5.0,
        prop::sample::select(RiskCategory::ALL.to_vec()),
    )
        .prop_map(|(cagr_3y, expense_ratio, alpha, risk_category)| FundMetrics {
            cagr_3y,
            expense_ratio,
            alpha,
            risk_category,
            ..Default::default()
        });
    (
        prop::collection::vec(stock, 2),
        prop::collection::vec(fund, 2),
    )
        .prop_map(|(stocks, funds)| {
            MetricsTable::new()
                .with_stock("TCS", stocks[0])
                .with_stock("INFY", stocks[1])
                .with_fund("HDFC_DEBT", funds[0])
                .with_fund("AXIS_BLUECHIP", funds[1])
        })
}

/// Generate a questionnaire with any combination of answers.
fn arb_questionnaire() -> impl Strategy<Value = Questionnaire> {
    (
        prop::sample::select(Purpose::ALL.to_vec()),
        prop::sample::select(Timeline::ALL.to_vec()),
        prop::sample::select(RecurringNeed::ALL.to_vec()),
        prop::sample::select(HasGoals::ALL.to_vec()),
        prop::sample::select(IncomeChange::ALL.to_vec()),
        prop::sample::subsequence(MEMBERS.to_vec(), 0..=2),
        arb_value(),
    )
        .prop_map(|(purpose, timeline, recurring, goals, income, priority, amount)| {
            let mut q = Questionnaire::new(amount)
                .with_purpose(purpose)
                .with_timeline(timeline)
                .with_recurring_need(recurring)
                .with_has_goals(goals)
                .with_income_change(income);
            for member in priority {
                q = q.with_priority_member(member);
            }
            q
        })
}

proptest! {
    // Everything requested is either raised or reported as shortfall.
    #[test]
    fn raised_plus_shortfall_equals_need(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        prop_assert_eq!(plan.total_raised() + plan.shortfall(), q.amount_needed());
        prop_assert!(plan.shortfall() >= Decimal::ZERO);
    }

    // Lines sum to the raised total, which never exceeds the need.
    #[test]
    fn lines_sum_to_raised_and_never_overshoot(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        let sum: Decimal = plan.lines().iter().map(|l| l.amount).sum();
        prop_assert_eq!(sum, plan.total_raised());
        prop_assert!(sum <= q.amount_needed(), "raised {} over need {}", sum, q.amount_needed());
    }

    // No line draws more than the allowed share of its holding, and none is empty.
    #[test]
    fn lines_respect_holding_cap(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        for line in plan.lines() {
            prop_assert!(line.amount > Decimal::ZERO);
            prop_assert!(
                line.amount <= line.holding_value * profile.max_fraction(),
                "{} drew {} of {}",
                line.asset_key,
                line.amount,
                line.holding_value
            );
        }
    }

    // A one-time need is always met when the portfolio is large enough.
    #[test]
    fn one_time_need_funded_when_portfolio_suffices(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let q = q.with_recurring_need(RecurringNeed::OneTime);
        prop_assume!(portfolio.total_value() >= q.amount_needed());
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        prop_assert!(plan.is_fully_funded());
        prop_assert_eq!(plan.total_raised(), q.amount_needed());
    }

    // Priority members are drawn before everyone else, and liquidity order
    // holds inside each bucket.
    #[test]
    fn ordering_priority_then_liquidity(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let order = LiquidationOptimizer::candidate_order(&portfolio, &profile);
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (pa, pb) = (profile.is_priority(a.member()), profile.is_priority(b.member()));
            prop_assert!(pa || !pb, "non-priority {} before priority {}", a, b);
            if pa == pb {
                prop_assert!(a.liquidity_tier() <= b.liquidity_tier(), "{} before {}", a, b);
            }
        }
    }

    // When goals are preserved and the need is not urgent, goal-linked
    // holdings trail the rest of their tier.
    #[test]
    fn goal_linked_holdings_trail_their_tier(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let q = q.with_has_goals(HasGoals::Yes);
        let profile = q.profile(&EngineConfig::default());
        prop_assume!(!profile.is_urgent());
        let order = LiquidationOptimizer::candidate_order(&portfolio, &profile);
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let same_bucket = profile.is_priority(a.member()) == profile.is_priority(b.member())
                && a.liquidity_tier() == b.liquidity_tier();
            if same_bucket {
                prop_assert!(
                    !a.is_goal_linked() || b.is_goal_linked(),
                    "goal-linked {} before {}",
                    a,
                    b
                );
            }
        }
    }

    // Zero-valued holdings never show up in a plan.
    #[test]
    fn zero_value_holdings_skipped(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        prop_assert!(plan.lines().iter().all(|l| l.holding_value > Decimal::ZERO));
    }

    // Metrics only reorder holdings inside a (priority, tier, deferral)
    // bucket: the bucket sequence matches the metric-free order exactly.
    #[test]
    fn metrics_never_cross_buckets(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
        metrics in arb_metrics(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let bucket = |h: &Holding| {
            (
                !profile.is_priority(h.member()),
                h.liquidity_tier(),
                profile.preserves_goals() && h.is_goal_linked() && !profile.is_urgent(),
            )
        };
        let plain: Vec<_> = LiquidationOptimizer::candidate_order(&portfolio, &profile)
            .into_iter()
            .map(bucket)
            .collect();
        let ranked: Vec<_> = LiquidationOptimizer::ranked_candidates(&portfolio, &profile, &metrics)
            .into_iter()
            .map(|c| bucket(c.holding))
            .collect();
        prop_assert_eq!(plain, ranked);
    }

    // Metrics change the order, never the amount raised.
    #[test]
    fn metrics_preserve_conservation(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
        metrics in arb_metrics(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let plan = LiquidationOptimizer::optimize_with(&portfolio, &profile, q.amount_needed(), &metrics);
        prop_assert_eq!(plan.total_raised() + plan.shortfall(), q.amount_needed());
        let sum: Decimal = plan.lines().iter().map(|l| l.amount).sum();
        prop_assert_eq!(sum, plan.total_raised());
    }

    // Same inputs, same plan.
    #[test]
    fn optimization_is_deterministic(
        portfolio in arb_portfolio(),
        q in arb_questionnaire(),
    ) {
        let profile = q.profile(&EngineConfig::default());
        let first = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        let second = LiquidationOptimizer::optimize(&portfolio, &profile, q.amount_needed());
        prop_assert_eq!(first, second);
    }
}
