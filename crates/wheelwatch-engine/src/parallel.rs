use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use wheelwatch_core::{Pattern, Spin};

use crate::generator::SpinGenerator;
use crate::metrics::{mean, percentile};
use crate::simulator::{BankrollSimulator, SimulationResult, StopReason};

/// Distribution of outcomes over many synthetic sequences.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloSummary {
    pub runs: usize,
    pub spins_per_run: usize,
    pub mean_final_bankroll: f64,
    pub median_final_bankroll: f64,
    pub p5_final_bankroll: f64,
    pub p95_final_bankroll: f64,
    /// Share of runs that went bankrupt.
    pub ruin_rate: f64,
    pub mean_max_drawdown: f64,
    pub mean_hit_rate: f64,
}

/// Runs independent simulations in parallel.
///
/// Each run stays sequential; only separate runs are spread across threads.
pub struct ParallelRunner {
    simulator: BankrollSimulator,
}

impl ParallelRunner {
    pub fn new(simulator: BankrollSimulator) -> Self {
        Self { simulator }
    }

    /// Every pattern over the same spins, results in pattern order.
    pub fn run_patterns(&self, patterns: &[Pattern], spins: &[Spin]) -> Vec<SimulationResult> {
        patterns
            .par_iter()
            .map(|pattern| self.simulator.run(pattern, spins))
            .collect()
    }

    /// One pattern over `runs` generated sequences; run `i` uses seed
    /// `seed + i`, so the summary is reproducible.
    pub fn monte_carlo(
        &self,
        pattern: &Pattern,
        runs: usize,
        spins_per_run: usize,
        seed: u64,
    ) -> MonteCarloSummary {
        let wheel = self.simulator.wheel();
        let results: Vec<(f64, bool, f64, f64)> = (0..runs)
            .into_par_iter()
            .map(|i| {
                let spins =
                    SpinGenerator::new(seed.wrapping_add(i as u64), wheel).generate(spins_per_run);
                let r = self.simulator.run(pattern, &spins);
                (
                    r.final_bankroll,
                    r.stop_reason == StopReason::Bankrupt,
                    r.max_drawdown,
                    r.hit_rate,
                )
            })
            .collect();
        debug!("monte carlo finished {runs} runs of {spins_per_run} spins");

        let mut finals: Vec<f64> = results.iter().map(|r| r.0).collect();
        finals.sort_unstable_by(f64::total_cmp);
        let ruined = results.iter().filter(|r| r.1).count();
        let drawdowns: Vec<f64> = results.iter().map(|r| r.2).collect();
        let hit_rates: Vec<f64> = results.iter().map(|r| r.3).collect();

        MonteCarloSummary {
            runs,
            spins_per_run,
            mean_final_bankroll: mean(&finals),
            median_final_bankroll: percentile(&finals, 50.0),
            p5_final_bankroll: percentile(&finals, 5.0),
            p95_final_bankroll: percentile(&finals, 95.0),
            ruin_rate: if runs > 0 {
                ruined as f64 / runs as f64
            } else {
                0.0
            },
            mean_max_drawdown: mean(&drawdowns),
            mean_hit_rate: mean(&hit_rates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulationParams;
    use wheelwatch_core::{Color, Dozen, StakingSystem, Step, WheelVariant};

    fn runner(system: StakingSystem, bankroll: f64) -> ParallelRunner {
        let params = SimulationParams {
            initial_bankroll: bankroll,
            base_bet: 10.0,
            system,
            stop_loss: 0.0,
            take_profit: 0.0,
        };
        ParallelRunner::new(BankrollSimulator::new(params, WheelVariant::European).unwrap())
    }

    #[test]
    fn test_run_patterns_matches_sequential() {
        let patterns = vec![
            Pattern::single(Step::Color(Color::Red)).unwrap(),
            Pattern::single(Step::Dozen(Dozen::Second)).unwrap(),
        ];
        let spins = SpinGenerator::new(3, WheelVariant::European).generate(300);
        let r = runner(StakingSystem::Flat, 1000.0);
        let results = r.run_patterns(&patterns, &spins);
        assert_eq!(results.len(), 2);
        for (pattern, result) in patterns.iter().zip(&results) {
            let single = r.simulator.run(pattern, &spins);
            assert_eq!(single.hits, result.hits);
            assert!((single.final_bankroll - result.final_bankroll).abs() < 1e-10);
        }
    }

    #[test]
    fn test_monte_carlo_reproducible() {
        let pattern = Pattern::single(Step::Color(Color::Black)).unwrap();
        let r = runner(StakingSystem::Martingale, 200.0);
        let a = r.monte_carlo(&pattern, 50, 200, 42);
        let b = r.monte_carlo(&pattern, 50, 200, 42);
        assert_eq!(a.runs, 50);
        assert!((a.mean_final_bankroll - b.mean_final_bankroll).abs() < 1e-10);
        assert!(a.p5_final_bankroll <= a.median_final_bankroll);
        assert!(a.median_final_bankroll <= a.p95_final_bankroll);
        assert!((0.0..=1.0).contains(&a.ruin_rate));
    }

    #[test]
    fn test_monte_carlo_zero_runs() {
        let pattern = Pattern::single(Step::Color(Color::Red)).unwrap();
        let s = runner(StakingSystem::Flat, 100.0).monte_carlo(&pattern, 0, 10, 1);
        assert_eq!(s.runs, 0);
        assert_eq!(s.ruin_rate, 0.0);
        assert_eq!(s.mean_final_bankroll, 0.0);
    }
}
