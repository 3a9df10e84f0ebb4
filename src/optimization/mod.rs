//! The liquidation decision core, sell scoring and response assembly.

pub mod optimizer;
pub mod response;
pub mod scoring;
