//! Sell scoring for individual stocks and mutual funds.
//!
//! A higher score means the holding is a better candidate to sell. Scores
//! only break ties between holdings that already share a priority bucket,
//! liquidity tier and deferral state; they never move a holding across
//! those boundaries.

use crate::core::holding::{AssetClass, Holding};
use crate::core::metrics::{AssetMetricsSource, FundMetrics, RiskCategory, StockMetrics};
use crate::core::questionnaire::Purpose;
use serde::{Deserialize, Serialize};

const STOCK_HIGH_PE: f64 = 40.0;
const STOCK_OVERBOUGHT_RSI: f64 = 70.0;
const STOCK_HIGH_PLEDGE: f64 = 20.0;
const STOCK_LOW_PROMOTER: f64 = 40.0;
const STOCK_HIGH_BETA: f64 = 1.8;
const STOCK_EMERGENCY_BETA: f64 = 1.5;
const STOCK_POOR_RELATIVE_RETURN: f64 = -15.0;
const STOCK_POOR_CAGR: f64 = 8.0;
const STOCK_PURCHASE_CAGR: f64 = 12.0;
const STOCK_HIGH_DEBT: f64 = 1.5;
const STOCK_LOW_RETURN_RATIO: f64 = 10.0;
const STOCK_LOW_DIVIDEND: f64 = 1.0;
const STOCK_HIGH_DIVIDEND: f64 = 4.0;

const FUND_POOR_CAGR: f64 = 10.0;
const FUND_PURCHASE_CAGR: f64 = 12.0;
const FUND_HIGH_EXPENSE: f64 = 2.0;
const FUND_HIGH_VOLATILITY: f64 = 20.0;
const FUND_EMERGENCY_VOLATILITY: f64 = 15.0;
const FUND_POOR_SHARPE: f64 = 0.5;
const FUND_NEGATIVE_ALPHA: f64 = -2.0;
const FUND_POOR_SORTINO: f64 = 0.8;
const FUND_HIGH_TRACKING_ERROR: f64 = 6.0;
const FUND_NEW_MONTHS: u32 = 24;

/// Penalty keeping goal-linked holdings off the top of the list.
const GOAL_LINK_PENALTY: i32 = 50;

/// Score and the metric signals behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellAssessment {
    pub score: u32,
    /// Short descriptions of each weak signal, in a fixed order.
    pub issues: Vec<String>,
}

impl SellAssessment {
    fn new(score: i32, issues: Vec<String>) -> Self {
        Self {
            score: score.max(0).unsigned_abs(),
            issues,
        }
    }

    /// One-line explanation: the issues, or the bare score when there are none.
    pub fn reason(&self) -> String {
        if self.issues.is_empty() {
            format!("sell score {}", self.score)
        } else {
            self.issues.join("; ")
        }
    }
}

/// Accumulates points and, for flagged signals, the matching issue text.
struct Tally {
    score: i32,
    issues: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            score: 0,
            issues: Vec::new(),
        }
    }

    fn flag(&mut self, hit: bool, points: i32, issue: &str) {
        if hit {
            self.score += points;
            self.issues.push(issue.to_string());
        }
    }

    fn add(&mut self, hit: bool, points: i32) {
        if hit {
            self.score += points;
        }
    }

    fn finish(self) -> SellAssessment {
        SellAssessment::new(self.score, self.issues)
    }
}

/// Score a stock for sale.
pub fn assess_stock(metrics: &StockMetrics, purpose: Purpose, goal_linked: bool) -> SellAssessment {
    let mut t = Tally::new();
    t.flag(metrics.pe_ratio > STOCK_HIGH_PE, 25, "Overvalued (PE > 40)");
    t.flag(metrics.rsi_14d > STOCK_OVERBOUGHT_RSI, 30, "Overbought (RSI > 70)");
    t.flag(
        metrics.pledged_promoter_holdings > STOCK_HIGH_PLEDGE,
        30,
        "High pledged holdings",
    );
    t.flag(metrics.promoter_holding < STOCK_LOW_PROMOTER, 20, "Low promoter holding");
    t.add(metrics.beta > STOCK_HIGH_BETA, 15);
    t.flag(
        metrics.six_month_return_vs_nifty < STOCK_POOR_RELATIVE_RETURN,
        25,
        "Poor recent performance",
    );
    t.flag(metrics.five_year_cagr < STOCK_POOR_CAGR, 20, "Poor long-term returns");
    t.flag(metrics.debt_to_equity > STOCK_HIGH_DEBT, 15, "High debt levels");
    t.flag(metrics.roce < STOCK_LOW_RETURN_RATIO, 15, "Low ROCE");
    t.flag(metrics.return_on_equity < STOCK_LOW_RETURN_RATIO, 15, "Low ROE");
    t.flag(metrics.free_cash_flow < 0.0, 20, "Negative free cash flow");

    match purpose {
        Purpose::Emergency => {
            t.add(metrics.beta > STOCK_EMERGENCY_BETA, 25);
            t.add(metrics.dividend_yield < STOCK_LOW_DIVIDEND, 10);
        }
        Purpose::PlannedPurchase => t.add(metrics.five_year_cagr < STOCK_PURCHASE_CAGR, 20),
        Purpose::LoanRepayment | Purpose::Other => {}
    }

    t.add(goal_linked, -GOAL_LINK_PENALTY);
    t.add(metrics.dividend_yield > STOCK_HIGH_DIVIDEND, -15);
    // Close to the long-term capital gains boundary.
    t.add((11..=12).contains(&metrics.months_held), 10);
    t.finish()
}

fn risk_points(category: RiskCategory) -> i32 {
    match category {
        RiskCategory::VeryHigh => 20,
        RiskCategory::High => 15,
        RiskCategory::ModeratelyHigh => 10,
        RiskCategory::Moderate => 5,
        RiskCategory::ModeratelyLow => 0,
        RiskCategory::Low => -5,
    }
}

/// Score a mutual fund for sale.
pub fn assess_fund(metrics: &FundMetrics, purpose: Purpose, goal_linked: bool) -> SellAssessment {
    let mut t = Tally::new();
    t.flag(metrics.cagr_3y < FUND_POOR_CAGR, 25, "Poor 3Y CAGR");
    t.flag(metrics.expense_ratio > FUND_HIGH_EXPENSE, 20, "High expense ratio");
    t.flag(metrics.volatility > FUND_HIGH_VOLATILITY, 15, "High volatility");
    t.flag(metrics.sharpe_ratio < FUND_POOR_SHARPE, 20, "Poor Sharpe ratio");
    t.flag(metrics.alpha < FUND_NEGATIVE_ALPHA, 25, "Negative alpha");
    t.flag(metrics.sortino_ratio < FUND_POOR_SORTINO, 15, "Poor Sortino ratio");
    t.flag(
        metrics.tracking_error > FUND_HIGH_TRACKING_ERROR,
        15,
        "High tracking error",
    );
    t.add(metrics.time_since_inception < FUND_NEW_MONTHS, 10);

    t.score += risk_points(metrics.risk_category);
    if metrics.risk_category.is_high() {
        t.issues
            .push(format!("High risk ({})", metrics.risk_category));
    }

    match purpose {
        Purpose::Emergency => {
            t.add(metrics.risk_category.is_high(), 25);
            t.add(metrics.volatility > FUND_EMERGENCY_VOLATILITY, 20);
        }
        Purpose::PlannedPurchase => t.add(metrics.cagr_3y < FUND_PURCHASE_CAGR, 15),
        Purpose::LoanRepayment | Purpose::Other => {}
    }

    t.add(goal_linked, -GOAL_LINK_PENALTY);
    t.finish()
}

/// Score one holding, if the source has metrics for it. Bank balances are
/// never scored.
pub fn assess(
    holding: &Holding,
    purpose: Purpose,
    metrics: &dyn AssetMetricsSource,
) -> Option<SellAssessment> {
    let goal_linked = holding.is_goal_linked();
    match holding.asset_class() {
        AssetClass::BankBalance => None,
        AssetClass::MutualFund => metrics
            .fund_metrics(holding.asset_key())
            .map(|m| assess_fund(&m, purpose, goal_linked)),
        AssetClass::Stock => metrics
            .stock_metrics(holding.asset_key())
            .map(|m| assess_stock(&m, purpose, goal_linked)),
    }
}
