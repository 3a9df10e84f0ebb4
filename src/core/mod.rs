//! Domain types: members, holdings, prices, asset metrics, portfolios, questionnaires.

pub mod error;
pub mod holding;
pub mod member;
pub mod metrics;
pub mod portfolio;
pub mod pricing;
pub mod questionnaire;
