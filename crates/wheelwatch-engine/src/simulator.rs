use log::info;
use serde::Serialize;

use wheelwatch_core::{Pattern, SimulationConfig, Spin, StakingSystem, WheelVariant};

use crate::metrics::{MetricsCalculator, SimulationMetrics};
use crate::staking::Stake;

/// One point of the bankroll trajectory; spin 0 is the starting bankroll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BankrollPoint {
    pub spin: usize,
    pub bankroll: f64,
}

/// A judged spin: a completed pattern cycle (won) or a miss.
///
/// Spins that only advance the pattern cursor place no bet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bet {
    pub spin: usize,
    pub stake: f64,
    pub won: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Bankrupt,
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Trajectory length minus the starting point.
    pub total_spins: usize,
    pub hits: u32,
    pub losses: u32,
    /// `hits / (hits + losses)`, 0 when nothing was judged.
    pub hit_rate: f64,
    pub final_bankroll: f64,
    pub peak_bankroll: f64,
    /// Largest absolute fall from a running peak.
    pub max_drawdown: f64,
    pub profit: f64,
    pub stop_reason: StopReason,
    pub trajectory: Vec<BankrollPoint>,
    #[serde(skip)]
    pub bets: Vec<Bet>,
    pub metrics: SimulationMetrics,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("initial bankroll must be positive, got {0}")]
    NonPositiveBankroll(f64),
    #[error("base bet must be positive, got {0}")]
    NonPositiveBet(f64),
    #[error("stop-loss and take-profit must not be negative, got {0}")]
    NegativeLimit(f64),
}

/// Staking and stop settings of a simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub initial_bankroll: f64,
    pub base_bet: f64,
    pub system: StakingSystem,
    /// 0 disables the stop-loss.
    pub stop_loss: f64,
    /// 0 disables the take-profit.
    pub take_profit: f64,
}

impl From<&SimulationConfig> for SimulationParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            initial_bankroll: config.initial_bankroll,
            base_bet: config.base_bet,
            system: config.system,
            stop_loss: config.stop_loss,
            take_profit: config.take_profit,
        }
    }
}

/// Replays a pattern over a spin sequence with bankroll management.
///
/// The pattern cursor moves exactly as the tracker's standard case: a
/// completed pass through the pattern wins the current bet, any miss loses
/// it. Stateful steps never match, so such patterns only lose.
#[derive(Debug, Clone, Copy)]
pub struct BankrollSimulator {
    params: SimulationParams,
    wheel: WheelVariant,
}

impl BankrollSimulator {
    pub fn new(params: SimulationParams, wheel: WheelVariant) -> Result<Self, SimulationError> {
        if !(params.initial_bankroll > 0.0) {
            return Err(SimulationError::NonPositiveBankroll(params.initial_bankroll));
        }
        if !(params.base_bet > 0.0) {
            return Err(SimulationError::NonPositiveBet(params.base_bet));
        }
        for limit in [params.stop_loss, params.take_profit] {
            if limit < 0.0 {
                return Err(SimulationError::NegativeLimit(limit));
            }
        }
        Ok(Self { params, wheel })
    }

    #[inline]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    #[inline]
    pub fn wheel(&self) -> WheelVariant {
        self.wheel
    }

    /// Run over `spins`, oldest first.
    pub fn run(&self, pattern: &Pattern, spins: &[Spin]) -> SimulationResult {
        let p = &self.params;
        let len = pattern.len() as u32;
        let mut stake = Stake::new(p.system, p.base_bet);
        let mut bankroll = p.initial_bankroll;
        let mut peak = bankroll;
        let mut max_drawdown = 0.0f64;
        let mut cursor = 0u32;
        let (mut hits, mut losses) = (0u32, 0u32);
        let mut stop_reason = StopReason::Completed;

        let mut trajectory = Vec::with_capacity(spins.len() + 1);
        trajectory.push(BankrollPoint { spin: 0, bankroll });
        let mut bets = Vec::new();

        for (i, &spin) in spins.iter().enumerate() {
            let index = i + 1;
            let bet = stake.next_bet();

            if pattern.step_at(cursor).matches(spin, self.wheel) {
                cursor = (cursor + 1) % len;
                if cursor == 0 {
                    hits += 1;
                    bankroll += bet;
                    stake.on_win();
                    bets.push(Bet { spin: index, stake: bet, won: true });
                }
            } else {
                cursor = 0;
                losses += 1;
                bankroll -= bet;
                stake.on_loss();
                bets.push(Bet { spin: index, stake: bet, won: false });
            }

            peak = peak.max(bankroll);
            max_drawdown = max_drawdown.max(peak - bankroll);
            trajectory.push(BankrollPoint { spin: index, bankroll });

            if bankroll <= 0.0 {
                stop_reason = StopReason::Bankrupt;
                trajectory.extend(
                    (index + 1..=spins.len()).map(|spin| BankrollPoint { spin, bankroll: 0.0 }),
                );
                break;
            }
            if p.stop_loss > 0.0 && bankroll <= p.stop_loss {
                info!("stop-loss {:.2} reached at spin {index}", p.stop_loss);
                stop_reason = StopReason::StopLoss;
                break;
            }
            if p.take_profit > 0.0 && bankroll >= p.take_profit {
                info!("take-profit {:.2} reached at spin {index}", p.take_profit);
                stop_reason = StopReason::TakeProfit;
                break;
            }
        }

        let events = hits + losses;
        let metrics = MetricsCalculator::calculate(&trajectory, &bets);

        SimulationResult {
            total_spins: trajectory.len() - 1,
            hits,
            losses,
            hit_rate: if events > 0 {
                hits as f64 / events as f64
            } else {
                0.0
            },
            final_bankroll: bankroll,
            peak_bankroll: peak,
            max_drawdown,
            profit: bankroll - p.initial_bankroll,
            stop_reason,
            trajectory,
            bets,
            metrics,
        }
    }
}

/// One-shot simulation; see [`BankrollSimulator::run`].
pub fn simulate(
    pattern: &Pattern,
    spins: &[Spin],
    params: SimulationParams,
    wheel: WheelVariant,
) -> Result<SimulationResult, SimulationError> {
    Ok(BankrollSimulator::new(params, wheel)?.run(pattern, spins))
}
