//! # liquidation-engine
//!
//! Questionnaire-driven asset liquidation planner.
//!
//! Given a household portfolio (mutual funds, stocks, bank balances per
//! member) and answers about urgency, purpose, recurrence, goals and
//! priority members, the engine decides which holdings to liquidate, in
//! what order, and how much from each, to raise a target amount.
//!
//! ## Architecture
//!
//! - **core**: members, holdings, pricing, asset metrics, portfolio normalization, questionnaire interpretation
//! - **optimization**: greedy liquidation optimizer, sell scoring and response assembly
//! - **engine**: request pipeline tying the two together
//! - **config**: tunable policy constants
//! - **simulation**: random scenario generation
//!
//! The engine is stateless: every call builds its own portfolio, profile
//! and plan, so one [`LiquidationEngine`](engine::LiquidationEngine) can be
//! shared freely across threads.

pub mod config;
pub mod core;
pub mod engine;
pub mod optimization;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{EngineConfig, ReserveTargets};
    pub use crate::core::error::ValidationError;
    pub use crate::core::holding::{AssetClass, Holding, LiquidityTier};
    pub use crate::core::member::MemberId;
    pub use crate::core::metrics::{
        AssetMetricsSource, FundMetrics, MetricsTable, NoMetrics, RiskCategory, StockMetrics,
    };
    pub use crate::core::portfolio::{Portfolio, PortfolioInput};
    pub use crate::core::pricing::{PriceSource, PriceTable};
    pub use crate::core::questionnaire::{
        HasGoals, IncomeChange, Purpose, Questionnaire, QuestionnaireInput, RecurringNeed, Timeline,
        UrgencyProfile,
    };
    pub use crate::engine::{LiquidationEngine, LiquidationRequest};
    pub use crate::optimization::optimizer::{
        AllocationLine, Candidate, LiquidationOptimizer, LiquidationPlan, Rationale,
    };
    pub use crate::optimization::response::{AllocationEntry, LiquidationResponse, SecondarySuggestion};
    pub use crate::optimization::scoring::SellAssessment;
}
