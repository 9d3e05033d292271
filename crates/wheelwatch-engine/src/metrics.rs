use serde::Serialize;

use crate::simulator::{BankrollPoint, Bet};

/// Derived figures for one simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimulationMetrics {
    pub total_return_pct: f64,
    /// Largest fall from a running peak, as a percentage of that peak.
    pub max_drawdown_pct: f64,
    pub largest_bet: f64,
    pub longest_win_run: usize,
    pub longest_loss_run: usize,
    pub total_bets: usize,
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn calculate(trajectory: &[BankrollPoint], bets: &[Bet]) -> SimulationMetrics {
        let curve: Vec<f64> = trajectory.iter().map(|p| p.bankroll).collect();
        let (longest_win_run, longest_loss_run) = Self::longest_runs(bets);

        SimulationMetrics {
            total_return_pct: Self::total_return(&curve) * 100.0,
            max_drawdown_pct: Self::max_drawdown(&curve) * 100.0,
            largest_bet: bets.iter().map(|b| b.stake).fold(0.0, f64::max),
            longest_win_run,
            longest_loss_run,
            total_bets: bets.len(),
        }
    }

    fn total_return(curve: &[f64]) -> f64 {
        match (curve.first(), curve.last()) {
            (Some(&first), Some(&last)) if curve.len() >= 2 && first != 0.0 => {
                (last - first) / first
            }
            _ => 0.0,
        }
    }

    fn max_drawdown(curve: &[f64]) -> f64 {
        if curve.len() < 2 {
            return 0.0;
        }
        let mut peak = curve[0];
        let mut max_dd = 0.0f64;
        for &value in &curve[1..] {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                max_dd = max_dd.max((peak - value) / peak);
            }
        }
        max_dd
    }

    fn longest_runs(bets: &[Bet]) -> (usize, usize) {
        let (mut wins, mut losses) = (0usize, 0usize);
        let (mut best_wins, mut best_losses) = (0usize, 0usize);
        for bet in bets {
            if bet.won {
                wins += 1;
                losses = 0;
                best_wins = best_wins.max(wins);
            } else {
                losses += 1;
                wins = 0;
                best_losses = best_losses.max(losses);
            }
        }
        (best_wins, best_losses)
    }
}

/// Value at percentile `p` (0-100) of an ascending slice, nearest rank.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(values: &[f64]) -> Vec<BankrollPoint> {
        values
            .iter()
            .enumerate()
            .map(|(spin, &bankroll)| BankrollPoint { spin, bankroll })
            .collect()
    }

    fn bet_seq(outcomes: &[(f64, bool)]) -> Vec<Bet> {
        outcomes
            .iter()
            .enumerate()
            .map(|(i, &(stake, won))| Bet {
                spin: i + 1,
                stake,
                won,
            })
            .collect()
    }

    #[test]
    fn test_max_drawdown() {
        let dd = MetricsCalculator::max_drawdown(&[100.0, 110.0, 105.0, 115.0, 100.0]);
        // Peak 115, trough 100 -> dd = 15/115
        assert!((dd - 15.0 / 115.0).abs() < 1e-10);
    }

    #[test]
    fn test_total_return() {
        let ret = MetricsCalculator::total_return(&[100.0, 110.0, 120.0]);
        assert!((ret - 0.2).abs() < 1e-10);
        assert_eq!(MetricsCalculator::total_return(&[100.0]), 0.0);
    }

    #[test]
    fn test_longest_runs() {
        let bets = bet_seq(&[(10.0, true), (10.0, false), (20.0, false), (40.0, false), (80.0, true)]);
        assert_eq!(MetricsCalculator::longest_runs(&bets), (1, 3));
    }

    #[test]
    fn test_metrics_full() {
        let bets = bet_seq(&[(10.0, false), (20.0, true)]);
        let m = MetricsCalculator::calculate(&curve(&[100.0, 90.0, 110.0]), &bets);
        assert!((m.total_return_pct - 10.0).abs() < 1e-10);
        assert!((m.max_drawdown_pct - 10.0).abs() < 1e-10);
        assert!((m.largest_bet - 20.0).abs() < 1e-10);
        assert_eq!(m.total_bets, 2);
    }

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&sorted, 50.0) - 3.0).abs() < 1e-10);
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < 1e-10);
        assert!((percentile(&sorted, 100.0) - 5.0).abs() < 1e-10);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
