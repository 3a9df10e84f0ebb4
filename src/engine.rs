//! Request pipeline: validate, normalize, optimize, assemble.

use crate::config::{ConfigError, EngineConfig};
use crate::core::error::Result;
use crate::core::metrics::{AssetMetricsSource, NoMetrics};
use crate::core::portfolio::{Portfolio, PortfolioInput};
use crate::core::pricing::PriceSource;
use crate::core::questionnaire::{Questionnaire, QuestionnaireInput, UrgencyProfile};
use crate::optimization::optimizer::{LiquidationOptimizer, LiquidationPlan};
use crate::optimization::response::LiquidationResponse;
use serde::{Deserialize, Serialize};

/// Inbound request: a portfolio snapshot plus questionnaire answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidationRequest {
    #[serde(default)]
    pub portfolio: PortfolioInput,
    #[serde(default)]
    pub questionnaire: QuestionnaireInput,
}

impl LiquidationRequest {
    pub fn new(portfolio: PortfolioInput, questionnaire: QuestionnaireInput) -> Self {
        Self {
            portfolio,
            questionnaire,
        }
    }
}

/// Everything the pipeline derived for one request.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub portfolio: Portfolio,
    pub questionnaire: Questionnaire,
    pub profile: UrgencyProfile,
    pub plan: LiquidationPlan,
}

/// Stateless liquidation engine.
///
/// Holds only configuration; each call builds its own portfolio, profile
/// and plan.
///
/// # Examples
///
/// ```
/// use liquidation_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let request: LiquidationRequest = serde_json::from_str(r#"{
///     "portfolio": {"bank_balances": {"A": 1000}},
///     "questionnaire": {"amount_needed": 500, "timeline": "today"}
/// }"#).unwrap();
///
/// let engine = LiquidationEngine::default();
/// let response = engine.process(&request, &PriceTable::new()).unwrap();
/// assert_eq!(response.total_raised, dec!(500));
/// assert_eq!(response.shortfall, dec!(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LiquidationEngine {
    config: EngineConfig,
}

impl LiquidationEngine {
    /// Engine with a custom configuration, rejected if inconsistent.
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run validation and optimization without asset metrics.
    pub fn evaluate(
        &self,
        request: &LiquidationRequest,
        prices: &dyn PriceSource,
    ) -> Result<Evaluation> {
        self.evaluate_with(request, prices, &NoMetrics)
    }

    /// Run validation and optimization, keeping every intermediate result.
    ///
    /// All input checks happen before the optimizer runs: questionnaire
    /// answers, portfolio values and prices, then priority members.
    pub fn evaluate_with(
        &self,
        request: &LiquidationRequest,
        prices: &dyn PriceSource,
        metrics: &dyn AssetMetricsSource,
    ) -> Result<Evaluation> {
        let questionnaire = Questionnaire::from_input(&request.questionnaire)?;
        let portfolio = Portfolio::from_input(&request.portfolio, prices)?;
        portfolio.ensure_members(questionnaire.priority_members())?;

        let profile = questionnaire.profile(&self.config);
        log::debug!(
            "urgency tier {} (urgent: {}), max fraction {}, {} priority members",
            profile.urgency_tier(),
            profile.is_urgent(),
            profile.max_fraction(),
            profile.priority_members().len()
        );

        let plan = LiquidationOptimizer::optimize_with(
            &portfolio,
            &profile,
            questionnaire.amount_needed(),
            metrics,
        );
        Ok(Evaluation {
            portfolio,
            questionnaire,
            profile,
            plan,
        })
    }

    /// Produce only the liquidation plan.
    pub fn plan(&self, request: &LiquidationRequest, prices: &dyn PriceSource) -> Result<LiquidationPlan> {
        Ok(self.evaluate(request, prices)?.plan)
    }

    /// Produce the response payload for a request.
    pub fn process(
        &self,
        request: &LiquidationRequest,
        prices: &dyn PriceSource,
    ) -> Result<LiquidationResponse> {
        self.process_with(request, prices, &NoMetrics)
    }

    /// Produce the response payload, ranking ties and suggesting switches
    /// from the given asset metrics.
    pub fn process_with(
        &self,
        request: &LiquidationRequest,
        prices: &dyn PriceSource,
        metrics: &dyn AssetMetricsSource,
    ) -> Result<LiquidationResponse> {
        let eval = self.evaluate_with(request, prices, metrics)?;
        Ok(LiquidationResponse::from_plan(
            &eval.plan,
            &eval.portfolio,
            &eval.profile,
            &self.config,
            metrics,
        ))
    }

    /// Decode a JSON request and process it.
    pub fn process_json(&self, json: &str, prices: &dyn PriceSource) -> Result<LiquidationResponse> {
        let request: LiquidationRequest = serde_json::from_str(json)?;
        self.process(&request, prices)
    }
}
