pub mod generator;
pub mod metrics;
pub mod parallel;
pub mod simulator;
pub mod staking;

pub use generator::SpinGenerator;
pub use metrics::{MetricsCalculator, SimulationMetrics};
pub use parallel::{MonteCarloSummary, ParallelRunner};
pub use simulator::{
    BankrollPoint, BankrollSimulator, Bet, SimulationError, SimulationParams, SimulationResult,
    StopReason, simulate,
};
pub use staking::Stake;
