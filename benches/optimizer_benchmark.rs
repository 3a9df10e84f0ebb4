use criterion::{black_box, criterion_group, criterion_main, Criterion};
use liquidation_engine::core::portfolio::Portfolio;
use liquidation_engine::core::questionnaire::Questionnaire;
use liquidation_engine::engine::LiquidationEngine;
use liquidation_engine::optimization::optimizer::LiquidationOptimizer;
use liquidation_engine::simulation::scenario::{generate_scenario_with, Scenario, ScenarioConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scenario(member_count: usize, holdings_per_member: usize) -> Scenario {
    let config = ScenarioConfig {
        member_count,
        holdings_per_member,
        ..Default::default()
    };
    generate_scenario_with(&config, &mut StdRng::seed_from_u64(0xC0FFEE))
}

fn bench_optimize(c: &mut Criterion, name: &str, member_count: usize, holdings: usize) {
    let scenario = scenario(member_count, holdings);
    let engine = LiquidationEngine::default();
    let questionnaire = Questionnaire::from_input(&scenario.request.questionnaire).unwrap();
    let portfolio = Portfolio::from_input(&scenario.request.portfolio, &scenario.prices).unwrap();
    let profile = questionnaire.profile(engine.config());

    c.bench_function(name, |b| {
        b.iter(|| {
            LiquidationOptimizer::optimize(
                black_box(&portfolio),
                black_box(&profile),
                questionnaire.amount_needed(),
            )
        })
    });
}

fn bench_optimize_10_members(c: &mut Criterion) {
    bench_optimize(c, "optimize_10_members", 10, 4);
}

fn bench_optimize_100_members(c: &mut Criterion) {
    bench_optimize(c, "optimize_100_members", 100, 6);
}

fn bench_optimize_1000_members(c: &mut Criterion) {
    bench_optimize(c, "optimize_1000_members", 1000, 6);
}

fn bench_optimize_with_metrics_100_members(c: &mut Criterion) {
    let scenario = scenario(100, 6);
    let engine = LiquidationEngine::default();
    let questionnaire = Questionnaire::from_input(&scenario.request.questionnaire).unwrap();
    let portfolio = Portfolio::from_input(&scenario.request.portfolio, &scenario.prices).unwrap();
    let profile = questionnaire.profile(engine.config());

    c.bench_function("optimize_with_metrics_100_members", |b| {
        b.iter(|| {
            LiquidationOptimizer::optimize_with(
                black_box(&portfolio),
                black_box(&profile),
                questionnaire.amount_needed(),
                &scenario.metrics,
            )
        })
    });
}

fn bench_full_pipeline_100_members(c: &mut Criterion) {
    let scenario = scenario(100, 6);
    let engine = LiquidationEngine::default();

    c.bench_function("process_100_members", |b| {
        b.iter(|| engine.process(black_box(&scenario.request), &scenario.prices))
    });
}

criterion_group!(
    benches,
    bench_optimize_10_members,
    bench_optimize_100_members,
    bench_optimize_1000_members,
    bench_optimize_with_metrics_100_members,
    bench_full_pipeline_100_members
);
criterion_main!(benches);
