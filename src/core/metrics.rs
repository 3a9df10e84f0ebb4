use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Regulator-assigned risk band of a mutual fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    ModeratelyLow,
    #[default]
    Moderate,
    ModeratelyHigh,
    High,
    VeryHigh,
}

impl RiskCategory {
    pub const ALL: &'static [RiskCategory] = &[
        RiskCategory::Low,
        RiskCategory::ModeratelyLow,
        RiskCategory::Moderate,
        RiskCategory::ModeratelyHigh,
        RiskCategory::High,
        RiskCategory::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::ModeratelyLow => "moderately_low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::ModeratelyHigh => "moderately_high",
            RiskCategory::High => "high",
            RiskCategory::VeryHigh => "very_high",
        }
    }

    /// High or very high.
    pub fn is_high(&self) -> bool {
        matches!(self, RiskCategory::High | RiskCategory::VeryHigh)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fundamentals and market signals for one listed stock.
///
/// Percentages are plain numbers (`12.5` means 12.5%). Missing fields take
/// neutral defaults, so a partial record never triggers a sell signal on
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockMetrics {
    pub pe_ratio: f64,
    pub rsi_14d: f64,
    /// Share of promoter holdings pledged, in percent.
    pub pledged_promoter_holdings: f64,
    pub promoter_holding: f64,
    pub beta: f64,
    pub six_month_return_vs_nifty: f64,
    pub five_year_cagr: f64,
    pub debt_to_equity: f64,
    pub roce: f64,
    pub return_on_equity: f64,
    pub dividend_yield: f64,
    pub free_cash_flow: f64,
    pub months_held: u32,
}

impl Default for StockMetrics {
    fn default() -> Self {
        Self {
            pe_ratio: 25.0,
            rsi_14d: 50.0,
            pledged_promoter_holdings: 0.0,
            promoter_holding: 50.0,
            beta: 1.0,
            six_month_return_vs_nifty: 0.0,
            five_year_cagr: 12.0,
            debt_to_equity: 0.5,
            roce: 15.0,
            return_on_equity: 15.0,
            dividend_yield: 2.0,
            free_cash_flow: 1000.0,
            months_held: 12,
        }
    }
}

/// Performance and cost figures for one mutual fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundMetrics {
    pub cagr_3y: f64,
    pub expense_ratio: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub alpha: f64,
    pub sortino_ratio: f64,
    pub tracking_error: f64,
    /// Fund age in months.
    pub time_since_inception: u32,
    pub risk_category: RiskCategory,
    pub months_held: u32,
}

impl Default for FundMetrics {
    fn default() -> Self {
        Self {
            cagr_3y: 12.0,
            expense_ratio: 1.5,
            volatility: 15.0,
            sharpe_ratio: 1.0,
            alpha: 0.0,
            sortino_ratio: 1.2,
            tracking_error: 3.0,
            time_since_inception: 60,
            risk_category: RiskCategory::Moderate,
            months_held: 12,
        }
    }
}

/// Source of per-asset quality metrics.
///
/// Injected the same way as [`PriceSource`](crate::core::pricing::PriceSource).
/// Assets the source does not know are never scored.
pub trait AssetMetricsSource {
    fn stock_metrics(&self, stock_id: &str) -> Option<StockMetrics>;
    fn fund_metrics(&self, fund_name: &str) -> Option<FundMetrics>;
}

/// Metrics source that knows nothing. Plans built with it rank purely by
/// priority, liquidity and goal deferral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetrics;

impl AssetMetricsSource for NoMetrics {
    fn stock_metrics(&self, _stock_id: &str) -> Option<StockMetrics> {
        None
    }

    fn fund_metrics(&self, _fund_name: &str) -> Option<FundMetrics> {
        None
    }
}

/// In-memory metrics keyed by stock id and fund name.
///
/// ```
/// use liquidation_engine::core::metrics::{AssetMetricsSource, MetricsTable};
///
/// let table = MetricsTable::from_json(
///     r#"{"stocks": {"TCS": {"pe_ratio": 45}}, "mutual_funds": {}}"#,
/// ).unwrap();
/// assert_eq!(table.stock_metrics("TCS").unwrap().pe_ratio, 45.0);
/// assert!(table.fund_metrics("HDFC_DEBT").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsTable {
    stocks: BTreeMap<String, StockMetrics>,
    mutual_funds: BTreeMap<String, FundMetrics>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_stock(mut self, stock_id: impl Into<String>, metrics: StockMetrics) -> Self {
        self.stocks.insert(stock_id.into(), metrics);
        self
    }

    pub fn with_fund(mut self, fund_name: impl Into<String>, metrics: FundMetrics) -> Self {
        self.mutual_funds.insert(fund_name.into(), metrics);
        self
    }

    pub fn len(&self) -> usize {
        self.stocks.len() + self.mutual_funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty() && self.mutual_funds.is_empty()
    }
}

impl AssetMetricsSource for MetricsTable {
    fn stock_metrics(&self, stock_id: &str) -> Option<StockMetrics> {
        self.stocks.get(stock_id).copied()
    }

    fn fund_metrics(&self, fund_name: &str) -> Option<FundMetrics> {
        self.mutual_funds.get(fund_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_records_take_neutral_defaults() {
        let table = MetricsTable::from_json(
            r#"{"stocks": {"YESBANK": {"pledged_promoter_holdings": 35.5}},
                "mutual_funds": {"QUANT_SMALLCAP": {"risk_category": "very_high"}}}"#,
        )
        .unwrap();
        let stock = table.stock_metrics("YESBANK").unwrap();
        assert_eq!(stock.pledged_promoter_holdings, 35.5);
        assert_eq!(stock.pe_ratio, 25.0);
        assert_eq!(stock.months_held, 12);

        let fund = table.fund_metrics("QUANT_SMALLCAP").unwrap();
        assert_eq!(fund.risk_category, RiskCategory::VeryHigh);
        assert_eq!(fund.expense_ratio, 1.5);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_sections_allowed() {
        let table = MetricsTable::from_json(r#"{"stocks": {"ITC": {}}}"#).unwrap();
        assert_eq!(table.stock_metrics("ITC"), Some(StockMetrics::default()));
        assert!(table.fund_metrics("ITC").is_none());
    }

    #[test]
    fn test_unknown_risk_category_rejected() {
        let err = MetricsTable::from_json(
            r#"{"mutual_funds": {"X": {"risk_category": "extreme"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn test_no_metrics_knows_nothing() {
        assert!(NoMetrics.stock_metrics("TCS").is_none());
        assert!(NoMetrics.fund_metrics("AXIS_BLUECHIP").is_none());
    }

    #[test]
    fn test_risk_category_order_and_names() {
        assert!(RiskCategory::Low < RiskCategory::VeryHigh);
        assert!(RiskCategory::High.is_high());
        assert!(!RiskCategory::ModeratelyHigh.is_high());
        assert_eq!(RiskCategory::ModeratelyLow.to_string(), "moderately_low");
        assert_eq!(RiskCategory::default(), RiskCategory::Moderate);
    }
}
