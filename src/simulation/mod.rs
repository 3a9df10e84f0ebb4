//! Random scenario generation for experiments, benchmarks and tests.

pub mod scenario;
