//! Random household scenarios.
//!
//! Generates always-valid liquidation requests together with a matching
//! price table and asset metrics, for benchmarking the optimizer and for
//! exploring the engine from the command line.

use crate::core::member::MemberId;
use crate::core::metrics::{FundMetrics, MetricsTable, RiskCategory, StockMetrics};
use crate::core::portfolio::PortfolioInput;
use crate::core::pricing::{PriceSource, PriceTable};
use crate::core::questionnaire::{
    HasGoals, IncomeChange, Purpose, QuestionnaireInput, RecurringNeed, Timeline,
};
use crate::engine::LiquidationRequest;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

const FUND_NAMES: &[&str] = &[
    "HDFC_FLEXICAP",
    "AXIS_BLUECHIP",
    "SBI_SMALLCAP",
    "ICICI_BALANCED",
    "HDFC_DEBT",
    "PARAG_PARIKH_FLEXI",
    "MIRAE_LARGECAP",
];

const STOCK_IDS: &[&str] = &[
    "RELIANCE",
    "TCS",
    "HDFC",
    "INFY",
    "ITC",
    "WIPRO",
    "BAJFINANCE",
    "HCLTECH",
];

/// Configuration for generating a random scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub member_count: usize,
    /// Funds plus stocks per member.
    pub holdings_per_member: usize,
    /// Upper bound for a bank balance or fund value.
    pub max_value: u64,
    /// Upper bound for a stock quantity.
    pub max_quantity: u64,
    /// Probability that a fund or stock is tagged goal-linked.
    pub goal_link_probability: f64,
    /// Requested amount as a percentage range of total portfolio value.
    pub need_percent: std::ops::Range<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            member_count: 3,
            holdings_per_member: 4,
            max_value: 500_000,
            max_quantity: 200,
            goal_link_probability: 0.3,
            need_percent: 1..120,
        }
    }
}

/// A generated request, the prices needed to value it and metrics for
/// every asset it can hold.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub request: LiquidationRequest,
    pub prices: PriceTable,
    pub metrics: MetricsTable,
}

/// Generate a random scenario with the thread-local RNG.
pub fn generate_random_scenario(config: &ScenarioConfig) -> Scenario {
    generate_scenario_with(config, &mut rand::thread_rng())
}

/// Generate a random scenario from the given RNG (seed it for reproducibility).
pub fn generate_scenario_with<R: Rng + ?Sized>(config: &ScenarioConfig, rng: &mut R) -> Scenario {
    let mut prices = PriceTable::new();
    for id in STOCK_IDS {
        // 100.00 to 4999.99
        let price = Decimal::new(rng.gen_range(10_000..500_000), 2);
        prices
            .set_price(*id, price)
            .expect("generated prices are positive");
    }

    let mut portfolio = PortfolioInput::new();
    let max_value = config.max_value.max(1);
    let max_quantity = config.max_quantity.max(1);

    let members: Vec<MemberId> = (0..config.member_count)
        .map(|i| MemberId::new(format!("MEMBER-{:02}", i)))
        .collect();

    for member in &members {
        let balance = Decimal::from(rng.gen_range(0..=max_value));
        portfolio = portfolio.with_bank_balance(member.clone(), balance);

        for _ in 0..config.holdings_per_member {
            let goal_linked = rng.gen_bool(config.goal_link_probability.clamp(0.0, 1.0));
            let key = if rng.gen_bool(0.5) {
                let name = FUND_NAMES[rng.gen_range(0..FUND_NAMES.len())];
                let value = Decimal::from(rng.gen_range(1..=max_value));
                portfolio = portfolio.with_mutual_fund(member.clone(), name, value);
                name
            } else {
                let id = STOCK_IDS[rng.gen_range(0..STOCK_IDS.len())];
                let quantity = Decimal::from(rng.gen_range(1..=max_quantity));
                portfolio = portfolio.with_stock(member.clone(), id, quantity);
                id
            };
            if goal_linked {
                portfolio = portfolio.with_goal_link(member.clone(), key);
            }
        }
    }

    let total = total_value(&portfolio, &prices);
    let pct = if config.need_percent.is_empty() {
        config.need_percent.start
    } else {
        rng.gen_range(config.need_percent.clone())
    };
    let amount_needed = (total * Decimal::from(pct) / Decimal::ONE_HUNDRED).round_dp(2);

    let priority_members: Vec<MemberId> = members
        .iter()
        .filter(|_| rng.gen_bool(0.25))
        .cloned()
        .collect();

    let questionnaire = QuestionnaireInput {
        purpose: pick(Purpose::ALL, rng).as_str().to_string(),
        timeline: pick(Timeline::ALL, rng).as_str().to_string(),
        amount_needed,
        recurring_need: pick(RecurringNeed::ALL, rng).as_str().to_string(),
        has_goals: pick(HasGoals::ALL, rng).as_str().to_string(),
        income_change: pick(IncomeChange::ALL, rng).as_str().to_string(),
        priority_members,
    };

    let mut metrics = MetricsTable::new();
    for id in STOCK_IDS {
        metrics = metrics.with_stock(*id, random_stock_metrics(rng));
    }
    for name in FUND_NAMES {
        metrics = metrics.with_fund(*name, random_fund_metrics(rng));
    }

    Scenario {
        request: LiquidationRequest::new(portfolio, questionnaire),
        prices,
        metrics,
    }
}

fn random_stock_metrics<R: Rng + ?Sized>(rng: &mut R) -> StockMetrics {
    StockMetrics {
        pe_ratio: rng.gen_range(5.0..80.0),
        rsi_14d: rng.gen_range(20.0..85.0),
        pledged_promoter_holdings: rng.gen_range(0.0..40.0),
        promoter_holding: rng.gen_range(20.0..75.0),
        beta: rng.gen_range(0.5..2.2),
        six_month_return_vs_nifty: rng.gen_range(-30.0..30.0),
        five_year_cagr: rng.gen_range(-5.0..30.0),
        debt_to_equity: rng.gen_range(0.0..2.5),
        roce: rng.gen_range(2.0..35.0),
        return_on_equity: rng.gen_range(2.0..35.0),
        dividend_yield: rng.gen_range(0.0..6.0),
        free_cash_flow: rng.gen_range(-2_000.0..10_000.0),
        months_held: rng.gen_range(1..=60),
    }
}

fn random_fund_metrics<R: Rng + ?Sized>(rng: &mut R) -> FundMetrics {
    FundMetrics {
        cagr_3y: rng.gen_range(2.0..25.0),
        expense_ratio: rng.gen_range(0.1..2.8),
        volatility: rng.gen_range(2.0..30.0),
        sharpe_ratio: rng.gen_range(0.0..2.0),
        alpha: rng.gen_range(-5.0..5.0),
        sortino_ratio: rng.gen_range(0.2..2.5),
        tracking_error: rng.gen_range(0.5..9.0),
        time_since_inception: rng.gen_range(6..=240),
        risk_category: pick(RiskCategory::ALL, rng),
        months_held: rng.gen_range(1..=60),
    }
}

fn total_value(portfolio: &PortfolioInput, prices: &PriceTable) -> Decimal {
    let bank: Decimal = portfolio.bank_balances.values().copied().sum();
    let funds: Decimal = portfolio
        .mutual_funds
        .values()
        .flat_map(|funds| funds.values())
        .copied()
        .sum();
    let stocks: Decimal = portfolio
        .stocks
        .values()
        .flat_map(|stocks| stocks.iter())
        .map(|(id, quantity)| *quantity * prices.price(id).unwrap_or_default())
        .sum();
    bank + funds + stocks
}

fn pick<T: Copy, R: Rng + ?Sized>(choices: &[T], rng: &mut R) -> T {
    *choices.choose(rng).expect("answer sets are never empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::AssetMetricsSource;
    use crate::engine::LiquidationEngine;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_scenarios_are_valid() {
        let engine = LiquidationEngine::default();
        let config = ScenarioConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let scenario = generate_scenario_with(&config, &mut rng);
            let response = engine
                .process_with(&scenario.request, &scenario.prices, &scenario.metrics)
                .unwrap();
            assert_eq!(
                response.total_raised + response.shortfall,
                scenario.request.questionnaire.amount_needed
            );
        }
    }

    #[test]
    fn test_every_asset_has_metrics() {
        let scenario = generate_scenario_with(&ScenarioConfig::default(), &mut StdRng::seed_from_u64(3));
        assert_eq!(scenario.metrics.len(), STOCK_IDS.len() + FUND_NAMES.len());
        for (member, funds) in &scenario.request.portfolio.mutual_funds {
            for name in funds.keys() {
                assert!(
                    scenario.metrics.fund_metrics(name).is_some(),
                    "{} holds {} without metrics",
                    member,
                    name
                );
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = ScenarioConfig {
            member_count: 5,
            holdings_per_member: 6,
            ..Default::default()
        };
        let a = generate_scenario_with(&config, &mut StdRng::seed_from_u64(42));
        let b = generate_scenario_with(&config, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.request, b.request);
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_member_count_respected() {
        let config = ScenarioConfig {
            member_count: 4,
            ..Default::default()
        };
        let scenario = generate_random_scenario(&config);
        assert_eq!(scenario.request.portfolio.bank_balances.len(), 4);
    }
}
