pub mod analysis;
pub mod config;
pub mod pattern;
pub mod spin;
pub mod stream;

pub use config::{ConfigError, SimulationConfig, StakingSystem, TrackerConfig, WheelwatchConfig};
pub use pattern::{Cyclical, Neighbors, Pattern, PatternError, Step, TargetNumbers};
pub use spin::{Color, Column, Dozen, Parity, Range, Spin, SpinError, WheelVariant};
pub use stream::{SpinLogError, SpinStats, SpinStream};
