use wheelwatch_core::StakingSystem;

const LABOUCHERE_START: [f64; 3] = [1.0, 2.0, 3.0];
const FIBONACCI_START: [f64; 2] = [1.0, 1.0];

/// Bet-sizing state for one simulation run.
///
/// Call [`Stake::next_bet`] before each spin, then exactly one of
/// [`Stake::on_win`] / [`Stake::on_loss`] once the spin is judged.
/// Amounts are in currency; Fibonacci terms and Labouchère tickets are in
/// units of the base bet.
#[derive(Debug, Clone)]
pub struct Stake {
    system: StakingSystem,
    base_bet: f64,
    bet: f64,
    fibonacci: Vec<f64>,
    tickets: Vec<f64>,
}

impl Stake {
    pub fn new(system: StakingSystem, base_bet: f64) -> Self {
        Self {
            system,
            base_bet,
            bet: base_bet,
            fibonacci: FIBONACCI_START.to_vec(),
            tickets: LABOUCHERE_START.to_vec(),
        }
    }

    #[inline]
    pub fn system(&self) -> StakingSystem {
        self.system
    }

    /// Amount at risk on the coming spin.
    ///
    /// Labouchère derives it from the ticket list here; an empty list means
    /// the last cycle completed and a fresh one starts.
    pub fn next_bet(&mut self) -> f64 {
        if self.system == StakingSystem::Labouchere {
            if self.tickets.is_empty() {
                self.tickets = LABOUCHERE_START.to_vec();
            }
            let units = match self.tickets.as_slice() {
                [only] => *only,
                [first, .., last] => first + last,
                [] => 0.0,
            };
            self.bet = units * self.base_bet;
        }
        self.bet
    }

    pub fn on_win(&mut self) {
        match self.system {
            StakingSystem::Flat | StakingSystem::Martingale => self.bet = self.base_bet,
            StakingSystem::DAlembert => {
                self.bet = self.base_bet.max(self.bet - self.base_bet);
            }
            StakingSystem::Fibonacci => {
                let keep = self.fibonacci.len().saturating_sub(2);
                self.fibonacci.truncate(keep);
                if self.fibonacci.len() < 2 {
                    self.fibonacci = FIBONACCI_START.to_vec();
                }
                self.bet = self.last_fibonacci() * self.base_bet;
            }
            StakingSystem::Labouchere => {
                if !self.tickets.is_empty() {
                    self.tickets.remove(0);
                }
                self.tickets.pop();
            }
        }
    }

    pub fn on_loss(&mut self) {
        match self.system {
            StakingSystem::Flat => self.bet = self.base_bet,
            StakingSystem::Martingale => self.bet *= 2.0,
            StakingSystem::DAlembert => self.bet += self.base_bet,
            StakingSystem::Fibonacci => {
                if self.fibonacci.len() < 2 {
                    self.fibonacci = FIBONACCI_START.to_vec();
                }
                let n = self.fibonacci.len();
                let next = self.fibonacci[n - 1] + self.fibonacci[n - 2];
                self.fibonacci.push(next);
                self.bet = next * self.base_bet;
            }
            StakingSystem::Labouchere => self.tickets.push(self.bet / self.base_bet),
        }
    }

    fn last_fibonacci(&self) -> f64 {
        self.fibonacci.last().copied().unwrap_or(1.0)
    }
}
