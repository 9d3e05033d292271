use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wheelwatch_core::{Spin, WheelVariant};

/// Reproducible source of fair synthetic spins.
pub struct SpinGenerator {
    rng: StdRng,
    pockets: Vec<Spin>,
}

impl SpinGenerator {
    pub fn new(seed: u64, wheel: WheelVariant) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            pockets: wheel.pockets().collect(),
        }
    }

    /// Uniform over every pocket of the wheel.
    pub fn next_spin(&mut self) -> Spin {
        self.pockets[self.rng.gen_range(0..self.pockets.len())]
    }

    /// `n` spins, oldest first.
    pub fn generate(&mut self, n: usize) -> Vec<Spin> {
        (0..n).map(|_| self.next_spin()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SpinGenerator::new(7, WheelVariant::European).generate(200);
        let b = SpinGenerator::new(7, WheelVariant::European).generate(200);
        let c = SpinGenerator::new(8, WheelVariant::European).generate(200);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_european_never_double_zero() {
        let spins = SpinGenerator::new(1, WheelVariant::European).generate(5000);
        assert!(spins.iter().all(|&s| s != Spin::DOUBLE_ZERO));
    }

    #[test]
    fn test_american_covers_double_zero() {
        let spins = SpinGenerator::new(1, WheelVariant::American).generate(5000);
        assert!(spins.contains(&Spin::DOUBLE_ZERO));
        assert!(spins.contains(&Spin::ZERO));
    }
}
