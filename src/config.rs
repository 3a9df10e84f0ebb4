//! Engine configuration.
//!
//! Every constant the questionnaire mapping and the greedy pass depend on
//! lives here. Defaults reproduce the documented policy; deployments can
//! override individual values through `LIQUIDATION_*` environment variables.

use crate::core::questionnaire::{Purpose, Timeline};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors arising from invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("{name} must be in (0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: Decimal },
    #[error("{name} must be in [0, 1], got {value}")]
    ReserveOutOfRange { name: &'static str, value: Decimal },
    #[error("urgency override tier {override_tier} exceeds max urgency tier {max_tier}")]
    OverrideAboveMax { override_tier: u8, max_tier: u8 },
    #[error("advisory thresholds must be increasing: {0}")]
    ThresholdOrder(String),
}

/// Bank share of the remaining portfolio suggested per purpose and timeline.
///
/// Advisory only: a shortfall against these targets produces a
/// recommendation, never a different plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveTargets {
    /// Emergency needed today, in 2-3 days or within a week.
    pub emergency_near_term: Decimal,
    /// Emergency needed in 1-4 weeks.
    pub emergency_weeks: Decimal,
    /// Emergency with no timeline.
    pub emergency_open: Decimal,
    /// Planned purchase with a timeline.
    pub planned_purchase: Decimal,
    /// Planned purchase with no timeline.
    pub planned_purchase_open: Decimal,
    pub loan_repayment: Decimal,
    pub other: Decimal,
}

impl Default for ReserveTargets {
    fn default() -> Self {
        Self {
            emergency_near_term: dec!(0.15),
            emergency_weeks: dec!(0.12),
            emergency_open: dec!(0.10),
            planned_purchase: dec!(0.10),
            planned_purchase_open: dec!(0.05),
            loan_repayment: dec!(0.12),
            other: dec!(0.08),
        }
    }
}

impl ReserveTargets {
    /// Target bank share for one purpose and timeline.
    pub fn target(&self, purpose: Purpose, timeline: Timeline) -> Decimal {
        match (purpose, timeline) {
            (Purpose::Emergency, Timeline::OneToFourWeeks) => self.emergency_weeks,
            (Purpose::Emergency, Timeline::NoTimeline) => self.emergency_open,
            (Purpose::Emergency, _) => self.emergency_near_term,
            (Purpose::PlannedPurchase, Timeline::NoTimeline) => self.planned_purchase_open,
            (Purpose::PlannedPurchase, _) => self.planned_purchase,
            (Purpose::LoanRepayment, _) => self.loan_repayment,
            (Purpose::Other, _) => self.other,
        }
    }

    fn entries(&self) -> [(&'static str, Decimal); 7] {
        [
            ("emergency_near_term", self.emergency_near_term),
            ("emergency_weeks", self.emergency_weeks),
            ("emergency_open", self.emergency_open),
            ("planned_purchase", self.planned_purchase),
            ("planned_purchase_open", self.planned_purchase_open),
            ("loan_repayment", self.loan_repayment),
            ("other", self.other),
        ]
    }
}

/// Tunable constants for the liquidation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Highest urgency tier; adjustments are capped here.
    pub max_urgency_tier: u8,
    /// At or above this tier, liquidity order overrides goal preservation.
    pub urgency_override_tier: u8,
    /// Added to the timeline tier when the purpose is an emergency.
    pub emergency_urgency_bump: u8,
    /// Added to the timeline tier when income is expected to fall.
    pub income_reduction_urgency_bump: u8,
    /// Largest share of a holding drawn for a one-time need.
    pub one_time_max_fraction: Decimal,
    /// Largest share of a holding drawn for a recurring need.
    pub recurring_max_fraction: Decimal,
    /// Liquidation percentage above which a moderate warning is issued.
    pub moderate_liquidation_percent: Decimal,
    /// Liquidation percentage above which a high warning is issued.
    pub high_liquidation_percent: Decimal,
    /// Liquidation percentage above which financial stability is at risk.
    pub critical_liquidation_percent: Decimal,
    pub reserve_targets: ReserveTargets,
    /// Stocks scoring above this are suggested for switching.
    pub poor_stock_score: u32,
    /// Mutual funds scoring above this are suggested for switching.
    pub poor_fund_score: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_urgency_tier: 4,
            urgency_override_tier: 3,
            emergency_urgency_bump: 1,
            income_reduction_urgency_bump: 1,
            one_time_max_fraction: Decimal::ONE,
            recurring_max_fraction: dec!(0.7),
            moderate_liquidation_percent: dec!(30),
            high_liquidation_percent: dec!(50),
            critical_liquidation_percent: dec!(80),
            reserve_targets: ReserveTargets::default(),
            poor_stock_score: 35,
            poor_fund_score: 30,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `LIQUIDATION_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        override_from_env("LIQUIDATION_MAX_URGENCY_TIER", &mut config.max_urgency_tier)?;
        override_from_env(
            "LIQUIDATION_URGENCY_OVERRIDE_TIER",
            &mut config.urgency_override_tier,
        )?;
        override_from_env(
            "LIQUIDATION_EMERGENCY_URGENCY_BUMP",
            &mut config.emergency_urgency_bump,
        )?;
        override_from_env(
            "LIQUIDATION_INCOME_REDUCTION_URGENCY_BUMP",
            &mut config.income_reduction_urgency_bump,
        )?;
        override_from_env(
            "LIQUIDATION_ONE_TIME_MAX_FRACTION",
            &mut config.one_time_max_fraction,
        )?;
        override_from_env(
            "LIQUIDATION_RECURRING_MAX_FRACTION",
            &mut config.recurring_max_fraction,
        )?;
        override_from_env(
            "LIQUIDATION_MODERATE_PERCENT",
            &mut config.moderate_liquidation_percent,
        )?;
        override_from_env("LIQUIDATION_HIGH_PERCENT", &mut config.high_liquidation_percent)?;
        override_from_env(
            "LIQUIDATION_CRITICAL_PERCENT",
            &mut config.critical_liquidation_percent,
        )?;

        let reserves = &mut config.reserve_targets;
        override_from_env(
            "LIQUIDATION_RESERVE_EMERGENCY_NEAR_TERM",
            &mut reserves.emergency_near_term,
        )?;
        override_from_env("LIQUIDATION_RESERVE_EMERGENCY_WEEKS", &mut reserves.emergency_weeks)?;
        override_from_env("LIQUIDATION_RESERVE_EMERGENCY_OPEN", &mut reserves.emergency_open)?;
        override_from_env(
            "LIQUIDATION_RESERVE_PLANNED_PURCHASE",
            &mut reserves.planned_purchase,
        )?;
        override_from_env(
            "LIQUIDATION_RESERVE_PLANNED_PURCHASE_OPEN",
            &mut reserves.planned_purchase_open,
        )?;
        override_from_env("LIQUIDATION_RESERVE_LOAN_REPAYMENT", &mut reserves.loan_repayment)?;
        override_from_env("LIQUIDATION_RESERVE_OTHER", &mut reserves.other)?;

        override_from_env("LIQUIDATION_POOR_STOCK_SCORE", &mut config.poor_stock_score)?;
        override_from_env("LIQUIDATION_POOR_FUND_SCORE", &mut config.poor_fund_score)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("one_time_max_fraction", self.one_time_max_fraction)?;
        check_fraction("recurring_max_fraction", self.recurring_max_fraction)?;
        if self.urgency_override_tier > self.max_urgency_tier {
            return Err(ConfigError::OverrideAboveMax {
                override_tier: self.urgency_override_tier,
                max_tier: self.max_urgency_tier,
            });
        }
        if !(self.moderate_liquidation_percent <= self.high_liquidation_percent
            && self.high_liquidation_percent <= self.critical_liquidation_percent)
        {
            return Err(ConfigError::ThresholdOrder(format!(
                "{} <= {} <= {}",
                self.moderate_liquidation_percent,
                self.high_liquidation_percent,
                self.critical_liquidation_percent
            )));
        }
        for (name, value) in self.reserve_targets.entries() {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::ReserveOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

fn check_fraction(name: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::FractionOutOfRange { name, value });
    }
    Ok(())
}

fn override_from_env<T: FromStr>(name: &'static str, slot: &mut T) -> Result<(), ConfigError> {
    if let Ok(raw) = std::env::var(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value: raw })?;
    }
    Ok(())
}
