use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Internal representation of the American `00` pocket.
pub const DOUBLE_ZERO: u8 = 37;

/// Largest valid spin value.
pub const MAX_SPIN: u8 = DOUBLE_ZERO;

pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Physical pocket order of the single-zero wheel, clockwise from 0.
pub const EUROPEAN_WHEEL: [u8; 37] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// Physical pocket order of the double-zero wheel, `00` stored as 37.
pub const AMERICAN_WHEEL: [u8; 38] = [
    0, 28, 9, 26, 30, 11, 7, 20, 32, 17, 5, 22, 34, 15, 3, 24, 36, 13, 1, 37, 27, 10, 25, 29, 12,
    8, 19, 31, 18, 6, 21, 33, 16, 4, 23, 35, 14, 2,
];

const OFF_WHEEL: u8 = u8::MAX;

/// Value -> wheel position, `OFF_WHEEL` for pockets the wheel does not have.
const fn positions<const N: usize>(order: &[u8; N]) -> [u8; 38] {
    let mut table = [OFF_WHEEL; 38];
    let mut i = 0;
    while i < N {
        table[order[i] as usize] = i as u8;
        i += 1;
    }
    table
}

const EUROPEAN_POSITIONS: [u8; 38] = positions(&EUROPEAN_WHEEL);
const AMERICAN_POSITIONS: [u8; 38] = positions(&AMERICAN_WHEEL);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpinError {
    #[error("spin value {0} is outside 0..=37")]
    OutOfRange(i64),
    #[error("cannot parse spin value {0:?}")]
    Parse(String),
}

/// One roulette outcome. Always within `0..=37`; 37 is `00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Spin(u8);

impl Spin {
    pub const ZERO: Spin = Spin(0);
    pub const DOUBLE_ZERO: Spin = Spin(DOUBLE_ZERO);

    pub fn new(value: u8) -> Result<Self, SpinError> {
        if value > MAX_SPIN {
            return Err(SpinError::OutOfRange(value as i64));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// 0 and 00 carry no color, parity, range, dozen or column.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0 || self.0 == DOUBLE_ZERO
    }

    pub fn color(self) -> Color {
        if self.is_zero() {
            Color::Green
        } else if RED_NUMBERS.contains(&self.0) {
            Color::Red
        } else {
            Color::Black
        }
    }

    pub fn parity(self) -> Option<Parity> {
        if self.is_zero() {
            return None;
        }
        Some(if self.0 % 2 == 0 { Parity::Even } else { Parity::Odd })
    }

    pub fn range(self) -> Option<Range> {
        if self.is_zero() {
            return None;
        }
        Some(if self.0 <= 18 { Range::Low } else { Range::High })
    }

    pub fn dozen(self) -> Option<Dozen> {
        match self.0 {
            _ if self.is_zero() => None,
            1..=12 => Some(Dozen::First),
            13..=24 => Some(Dozen::Second),
            _ => Some(Dozen::Third),
        }
    }

    pub fn column(self) -> Option<Column> {
        if self.is_zero() {
            return None;
        }
        Some(match self.0 % 3 {
            1 => Column::First,
            2 => Column::Second,
            _ => Column::Third,
        })
    }
}

impl TryFrom<i64> for Spin {
    type Error = SpinError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(0..=MAX_SPIN as i64).contains(&value) {
            return Err(SpinError::OutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Spin> for u8 {
    fn from(spin: Spin) -> Self {
        spin.0
    }
}

impl FromStr for Spin {
    type Err = SpinError;

    /// Accepts plain integers and the `00` notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "00" {
            return Ok(Self::DOUBLE_ZERO);
        }
        let value: i64 = s.parse().map_err(|_| SpinError::Parse(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == DOUBLE_ZERO {
            f.write_str("00")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

/// Low is 1-18, high is 19-36.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Range {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dozen {
    First,
    Second,
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    First,
    Second,
    Third,
}

/// Which physical wheel the spins come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelVariant {
    #[default]
    European,
    American,
}

impl WheelVariant {
    pub fn order(self) -> &'static [u8] {
        match self {
            WheelVariant::European => &EUROPEAN_WHEEL,
            WheelVariant::American => &AMERICAN_WHEEL,
        }
    }

    /// Number of pockets on the wheel (37 or 38).
    #[inline]
    pub fn pocket_count(self) -> usize {
        self.order().len()
    }

    fn position(self, spin: Spin) -> Option<usize> {
        let table = match self {
            WheelVariant::European => &EUROPEAN_POSITIONS,
            WheelVariant::American => &AMERICAN_POSITIONS,
        };
        match table[spin.0 as usize] {
            OFF_WHEEL => None,
            pos => Some(pos as usize),
        }
    }

    /// Whether `spin` sits within `radius` pockets of `center`, center included.
    ///
    /// A center that is not on this wheel only matches itself.
    pub fn is_neighbor(self, spin: Spin, center: Spin, radius: u8) -> bool {
        if spin == center {
            return true;
        }
        let (Some(c), Some(s)) = (self.position(center), self.position(spin)) else {
            return false;
        };
        let n = self.pocket_count();
        let diff = c.abs_diff(s);
        diff.min(n - diff) <= radius as usize
    }

    /// The pockets covered by a neighbors bet, center first then alternating
    /// right/left outwards.
    pub fn neighbors(self, center: Spin, radius: u8) -> Vec<Spin> {
        let Some(c) = self.position(center) else {
            return vec![center];
        };
        let order = self.order();
        let n = order.len();
        let mut out = vec![center];
        for i in 1..=radius as usize {
            for idx in [(c + i) % n, (c + n - i % n) % n] {
                let spin = Spin(order[idx]);
                if !out.contains(&spin) {
                    out.push(spin);
                }
            }
        }
        out
    }

    /// All spin values that can occur on this wheel, in numeric order.
    pub fn pockets(self) -> impl Iterator<Item = Spin> {
        let max = match self {
            WheelVariant::European => 36,
            WheelVariant::American => DOUBLE_ZERO,
        };
        (0..=max).map(Spin)
    }
}

impl fmt::Display for WheelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelVariant::European => f.write_str("european"),
            WheelVariant::American => f.write_str("american"),
        }
    }
}

impl FromStr for WheelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "european" | "eu" => Ok(WheelVariant::European),
            "american" | "us" => Ok(WheelVariant::American),
            other => Err(format!("unknown wheel variant: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin(v: u8) -> Spin {
        Spin::new(v).unwrap()
    }

    #[test]
    fn test_spin_range_validation() {
        assert!(Spin::new(37).is_ok());
        assert_eq!(Spin::new(38), Err(SpinError::OutOfRange(38)));
        assert_eq!(Spin::try_from(-1i64), Err(SpinError::OutOfRange(-1)));
    }

    #[test]
    fn test_parse_double_zero() {
        assert_eq!("00".parse::<Spin>().unwrap(), Spin::DOUBLE_ZERO);
        assert_eq!(" 17 ".parse::<Spin>().unwrap(), spin(17));
        assert!("x".parse::<Spin>().is_err());
        assert_eq!(Spin::DOUBLE_ZERO.to_string(), "00");
    }

    #[test]
    fn test_zero_pockets_are_colorless() {
        for z in [Spin::ZERO, Spin::DOUBLE_ZERO] {
            assert_eq!(z.color(), Color::Green);
            assert_eq!(z.parity(), None);
            assert_eq!(z.range(), None);
            assert_eq!(z.dozen(), None);
            assert_eq!(z.column(), None);
        }
    }

    #[test]
    fn test_predicates() {
        assert_eq!(spin(1).color(), Color::Red);
        assert_eq!(spin(2).color(), Color::Black);
        assert_eq!(spin(18).range(), Some(Range::Low));
        assert_eq!(spin(19).range(), Some(Range::High));
        assert_eq!(spin(12).dozen(), Some(Dozen::First));
        assert_eq!(spin(13).dozen(), Some(Dozen::Second));
        assert_eq!(spin(25).dozen(), Some(Dozen::Third));
        assert_eq!(spin(34).column(), Some(Column::First));
        assert_eq!(spin(35).column(), Some(Column::Second));
        assert_eq!(spin(36).column(), Some(Column::Third));
        assert_eq!(spin(36).parity(), Some(Parity::Even));
    }

    #[test]
    fn test_neighbors_european() {
        // 0 sits between 26 and 32
        let n = WheelVariant::European.neighbors(Spin::ZERO, 1);
        assert_eq!(n, vec![spin(0), spin(32), spin(26)]);
        assert!(WheelVariant::European.is_neighbor(spin(26), Spin::ZERO, 1));
        assert!(!WheelVariant::European.is_neighbor(spin(15), Spin::ZERO, 1));
        assert!(WheelVariant::European.is_neighbor(spin(15), Spin::ZERO, 2));
    }

    #[test]
    fn test_neighbors_american_double_zero() {
        let n = WheelVariant::American.neighbors(Spin::DOUBLE_ZERO, 1);
        assert_eq!(n, vec![Spin::DOUBLE_ZERO, spin(27), spin(1)]);
    }

    #[test]
    fn test_neighbors_off_wheel_center() {
        // 00 does not exist on the single-zero wheel
        let n = WheelVariant::European.neighbors(Spin::DOUBLE_ZERO, 3);
        assert_eq!(n, vec![Spin::DOUBLE_ZERO]);
        assert!(!WheelVariant::European.is_neighbor(spin(1), Spin::DOUBLE_ZERO, 3));
    }

    #[test]
    fn test_neighbors_membership_agrees_with_list() {
        for variant in [WheelVariant::European, WheelVariant::American] {
            for radius in [0u8, 1, 2, 5, 20] {
                let center = spin(17);
                let list = variant.neighbors(center, radius);
                for pocket in variant.pockets() {
                    assert_eq!(
                        list.contains(&pocket),
                        variant.is_neighbor(pocket, center, radius),
                        "{variant} r={radius} pocket={pocket}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_wheel_covers_every_pocket_once() {
        let mut eu: Vec<u8> = EUROPEAN_WHEEL.to_vec();
        eu.sort_unstable();
        assert_eq!(eu, (0..=36).collect::<Vec<u8>>());
        let mut us: Vec<u8> = AMERICAN_WHEEL.to_vec();
        us.sort_unstable();
        assert_eq!(us, (0..=37).collect::<Vec<u8>>());
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let ok: Spin = serde_json::from_str("37").unwrap();
        assert_eq!(ok, Spin::DOUBLE_ZERO);
        assert!(serde_json::from_str::<Spin>("38").is_err());
        assert!(serde_json::from_str::<Spin>("-2").is_err());
        assert_eq!(serde_json::to_string(&spin(5)).unwrap(), "5");
    }
}
