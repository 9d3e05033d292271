use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wheelwatch_core::{Color, Dozen, Neighbors, Parity, Pattern, Spin, StakingSystem, Step, WheelVariant};
use wheelwatch_engine::{BankrollSimulator, ParallelRunner, SimulationParams, SpinGenerator};

fn simulator(system: StakingSystem) -> BankrollSimulator {
    let params = SimulationParams {
        initial_bankroll: 1_000_000.0,
        base_bet: 1.0,
        system,
        stop_loss: 0.0,
        take_profit: 0.0,
    };
    BankrollSimulator::new(params, WheelVariant::European).expect("valid bench params")
}

fn patterns() -> Vec<Pattern> {
    vec![
        Pattern::single(Step::Color(Color::Red)).expect("valid pattern"),
        Pattern::new(vec![Step::Parity(Parity::Even), Step::Dozen(Dozen::Third)])
            .expect("valid pattern"),
        Pattern::single(Step::Neighbors(Neighbors {
            center: Spin::ZERO,
            radius: 2,
        }))
        .expect("valid pattern"),
    ]
}

fn bench_single_simulation(c: &mut Criterion) {
    let spins = SpinGenerator::new(42, WheelVariant::European).generate(100_000);
    let sim = simulator(StakingSystem::Fibonacci);
    let pattern = &patterns()[0];

    c.bench_function("single_simulation_100k", |b| {
        b.iter(|| {
            let result = sim.run(black_box(pattern), black_box(&spins));
            black_box(result);
        });
    });
}

fn bench_patterns_parallel(c: &mut Criterion) {
    let spins = SpinGenerator::new(42, WheelVariant::European).generate(100_000);
    let runner = ParallelRunner::new(simulator(StakingSystem::DAlembert));
    let patterns = patterns();

    c.bench_function("patterns_parallel_100k", |b| {
        b.iter(|| {
            let results = runner.run_patterns(black_box(&patterns), black_box(&spins));
            black_box(results);
        });
    });
}

fn bench_monte_carlo(c: &mut Criterion) {
    let runner = ParallelRunner::new(simulator(StakingSystem::Martingale));
    let pattern = &patterns()[0];

    c.bench_function("monte_carlo_200x1k", |b| {
        b.iter(|| {
            let summary = runner.monte_carlo(black_box(pattern), 200, 1_000, 42);
            black_box(summary);
        });
    });
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_100k", |b| {
        b.iter(|| {
            let spins = SpinGenerator::new(black_box(7), WheelVariant::American).generate(100_000);
            black_box(spins);
        });
    });
}

criterion_group!(
    benches,
    bench_single_simulation,
    bench_patterns_parallel,
    bench_monte_carlo,
    bench_generate,
);
criterion_main!(benches);
