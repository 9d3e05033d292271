use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spin::{Color, Column, Dozen, Parity, Range, Spin, WheelVariant};

/// One rule inside a betting pattern.
///
/// Serialized as `{"type": "<kind>", "value": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Step {
    Color(Color),
    Parity(Parity),
    Range(Range),
    Dozen(Dozen),
    Column(Column),
    SingleNumber(Spin),
    NumberSet(Vec<Spin>),
    Neighbors(Neighbors),
    /// Stateful: a base hit arms the step, the following spin is judged
    /// against the targets.
    TargetNumbers(TargetNumbers),
    /// Stateful: a target hit schedules a re-check `interval` spins later.
    Cyclical(Cyclical),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    pub center: Spin,
    /// Pockets taken on each side of the center.
    #[serde(rename = "count")]
    pub radius: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNumbers {
    pub base: Vec<Spin>,
    pub targets: Vec<Spin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cyclical {
    pub target: Box<Step>,
    pub interval: u32,
    /// Older saved strategies predate this flag; they behaved as `true`.
    #[serde(default = "default_true")]
    pub ignore_subsequent: bool,
}

fn default_true() -> bool {
    true
}

impl Step {
    /// Snake-case kind name, as used in the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Color(_) => "color",
            Step::Parity(_) => "parity",
            Step::Range(_) => "range",
            Step::Dozen(_) => "dozen",
            Step::Column(_) => "column",
            Step::SingleNumber(_) => "single_number",
            Step::NumberSet(_) => "number_set",
            Step::Neighbors(_) => "neighbors",
            Step::TargetNumbers(_) => "target_numbers",
            Step::Cyclical(_) => "cyclical",
        }
    }

    /// Steps whose outcome depends on earlier spins.
    #[inline]
    pub fn is_stateful(&self) -> bool {
        matches!(self, Step::TargetNumbers(_) | Step::Cyclical(_))
    }

    /// Stateless match of a single spin against this step.
    ///
    /// Stateful steps never match here; they are resolved by the tracker's
    /// state machine.
    pub fn matches(&self, spin: Spin, wheel: WheelVariant) -> bool {
        match self {
            Step::Color(c) => spin.color() == *c,
            Step::Parity(p) => spin.parity() == Some(*p),
            Step::Range(r) => spin.range() == Some(*r),
            Step::Dozen(d) => spin.dozen() == Some(*d),
            Step::Column(c) => spin.column() == Some(*c),
            Step::SingleNumber(n) => spin == *n,
            Step::NumberSet(set) => set.contains(&spin),
            Step::Neighbors(n) => wheel.is_neighbor(spin, n.center, n.radius),
            Step::TargetNumbers(_) | Step::Cyclical(_) => false,
        }
    }

    fn validate(&self) -> Result<(), PatternError> {
        match self {
            Step::NumberSet(set) if set.is_empty() => Err(PatternError::EmptySet("number_set")),
            Step::TargetNumbers(t) if t.base.is_empty() => Err(PatternError::EmptySet("base")),
            Step::TargetNumbers(t) if t.targets.is_empty() => {
                Err(PatternError::EmptySet("targets"))
            }
            Step::Cyclical(c) => {
                if c.interval == 0 {
                    return Err(PatternError::ZeroInterval);
                }
                if c.target.is_stateful() {
                    return Err(PatternError::StatefulCyclicalTarget(c.target.kind()));
                }
                c.target.validate()
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Color(Color::Red) => f.write_str("Red"),
            Step::Color(Color::Black) => f.write_str("Black"),
            Step::Color(Color::Green) => f.write_str("Green"),
            Step::Parity(Parity::Even) => f.write_str("Even"),
            Step::Parity(Parity::Odd) => f.write_str("Odd"),
            Step::Range(Range::Low) => f.write_str("Low (1-18)"),
            Step::Range(Range::High) => f.write_str("High (19-36)"),
            Step::Dozen(d) => write!(f, "Dozen {}", *d as u8 + 1),
            Step::Column(c) => write!(f, "Column {}", *c as u8 + 1),
            Step::SingleNumber(n) => write!(f, "Number {n}"),
            Step::NumberSet(set) => write!(f, "Set ({})", set.len()),
            Step::Neighbors(n) => write!(f, "N({}±{})", n.center, n.radius),
            Step::TargetNumbers(t) => {
                write!(f, "Target(B:{}→T:{})", t.base.len(), t.targets.len())
            }
            Step::Cyclical(c) => write!(f, "Every {} spins: {}", c.interval, c.target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern has no steps")]
    Empty,
    #[error("a cyclical step must be the only step in its pattern")]
    CyclicalNotAlone,
    #[error("a target_numbers step must be the only step in its pattern")]
    TargetNumbersNotAlone,
    #[error("cyclical target cannot be a stateful {0} step")]
    StatefulCyclicalTarget(&'static str),
    #[error("{0} set is empty")]
    EmptySet(&'static str),
    #[error("cyclical interval must be at least 1")]
    ZeroInterval,
}

/// A validated, non-empty, ordered list of steps.
///
/// Stateful steps (cyclical, target numbers) can only appear alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Step>", into = "Vec<Step>")]
pub struct Pattern {
    steps: Vec<Step>,
}

impl Pattern {
    pub fn new(steps: Vec<Step>) -> Result<Self, PatternError> {
        if steps.is_empty() {
            return Err(PatternError::Empty);
        }
        if steps.len() > 1 {
            if steps.iter().any(|s| matches!(s, Step::Cyclical(_))) {
                return Err(PatternError::CyclicalNotAlone);
            }
            if steps.iter().any(|s| matches!(s, Step::TargetNumbers(_))) {
                return Err(PatternError::TargetNumbersNotAlone);
            }
        }
        for step in &steps {
            step.validate()?;
        }
        Ok(Self { steps })
    }

    /// Convenience for single-step patterns.
    pub fn single(step: Step) -> Result<Self, PatternError> {
        Self::new(vec![step])
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed pattern; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step the cursor currently points at.
    #[inline]
    pub fn step_at(&self, cursor: u32) -> &Step {
        &self.steps[cursor as usize % self.steps.len()]
    }

    /// Human-readable name built from the step labels.
    pub fn label(&self) -> String {
        self.steps
            .iter()
            .map(Step::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl TryFrom<Vec<Step>> for Pattern {
    type Error = PatternError;

    fn try_from(steps: Vec<Step>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<Pattern> for Vec<Step> {
    fn from(pattern: Pattern) -> Self {
        pattern.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spins(values: &[u8]) -> Vec<Spin> {
        values.iter().map(|&v| Spin::new(v).unwrap()).collect()
    }

    fn cyclical(target: Step) -> Step {
        Step::Cyclical(Cyclical {
            target: Box::new(target),
            interval: 3,
            ignore_subsequent: true,
        })
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert_eq!(Pattern::new(vec![]), Err(PatternError::Empty));
    }

    #[test]
    fn test_cyclical_must_be_alone() {
        let err = Pattern::new(vec![Step::Color(Color::Red), cyclical(Step::Color(Color::Red))]);
        assert_eq!(err, Err(PatternError::CyclicalNotAlone));
        assert!(Pattern::single(cyclical(Step::Color(Color::Red))).is_ok());
    }

    #[test]
    fn test_cyclical_target_cannot_be_stateful() {
        let nested = cyclical(cyclical(Step::Color(Color::Red)));
        assert_eq!(
            Pattern::single(nested),
            Err(PatternError::StatefulCyclicalTarget("cyclical"))
        );
    }

    #[test]
    fn test_target_numbers_must_be_alone() {
        let t = Step::TargetNumbers(TargetNumbers {
            base: spins(&[1]),
            targets: spins(&[2]),
        });
        assert_eq!(
            Pattern::new(vec![t, Step::Parity(Parity::Odd)]),
            Err(PatternError::TargetNumbersNotAlone)
        );
    }

    #[test]
    fn test_empty_sets_rejected() {
        assert_eq!(
            Pattern::single(Step::NumberSet(vec![])),
            Err(PatternError::EmptySet("number_set"))
        );
        let t = Step::TargetNumbers(TargetNumbers {
            base: spins(&[1]),
            targets: vec![],
        });
        assert_eq!(Pattern::single(t), Err(PatternError::EmptySet("targets")));
    }

    #[test]
    fn test_step_at_wraps() {
        let p = Pattern::new(vec![Step::Color(Color::Red), Step::Color(Color::Black)]).unwrap();
        assert_eq!(p.step_at(0), &Step::Color(Color::Red));
        assert_eq!(p.step_at(3), &Step::Color(Color::Black));
    }

    #[test]
    fn test_stateless_matches() {
        let eu = WheelVariant::European;
        let s = |v: u8| Spin::new(v).unwrap();
        assert!(Step::Color(Color::Red).matches(s(1), eu));
        assert!(!Step::Color(Color::Red).matches(s(0), eu));
        assert!(Step::Color(Color::Green).matches(Spin::DOUBLE_ZERO, eu));
        assert!(!Step::Parity(Parity::Even).matches(s(0), eu));
        assert!(Step::Dozen(Dozen::Third).matches(s(25), eu));
        assert!(Step::Column(Column::First).matches(s(34), eu));
        assert!(Step::NumberSet(spins(&[4, 9])).matches(s(9), eu));
        let n = Step::Neighbors(Neighbors { center: s(0), radius: 1 });
        assert!(n.matches(s(32), eu));
        assert!(n.matches(s(26), eu));
        assert!(!n.matches(s(15), eu));
        assert!(!cyclical(Step::Color(Color::Red)).matches(s(1), eu));
    }

    #[test]
    fn test_label() {
        let p = Pattern::new(vec![
            Step::Color(Color::Red),
            Step::Dozen(Dozen::Second),
            Step::Neighbors(Neighbors {
                center: Spin::new(17).unwrap(),
                radius: 2,
            }),
        ])
        .unwrap();
        assert_eq!(p.label(), "Red → Dozen 2 → N(17±2)");
        let c = Pattern::single(cyclical(Step::SingleNumber(Spin::DOUBLE_ZERO))).unwrap();
        assert_eq!(c.label(), "Every 3 spins: Number 00");
        assert_eq!(Step::Column(Column::First).to_string(), "Column 1");
    }

    #[test]
    fn test_serde_shape() {
        let p = Pattern::new(vec![
            Step::Color(Color::Red),
            Step::Neighbors(Neighbors {
                center: Spin::new(5).unwrap(),
                radius: 1,
            }),
        ])
        .unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"color","value":"red"},{"type":"neighbors","value":{"center":5,"count":1}}]"#
        );
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_cyclical_missing_flag_defaults_true() {
        let json = r#"[{"type":"cyclical","value":{"target":{"type":"color","value":"black"},"interval":4}}]"#;
        let p: Pattern = serde_json::from_str(json).unwrap();
        match &p.steps()[0] {
            Step::Cyclical(c) => {
                assert!(c.ignore_subsequent);
                assert_eq!(c.interval, 4);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern_fails_deserialization() {
        let json = r#"[{"type":"color","value":"red"},{"type":"cyclical","value":{"target":{"type":"color","value":"red"},"interval":2,"ignoreSubsequent":false}}]"#;
        assert!(serde_json::from_str::<Pattern>(json).is_err());
        assert!(serde_json::from_str::<Pattern>("[]").is_err());
        assert!(serde_json::from_str::<Pattern>(r#"[{"type":"single_number","value":40}]"#).is_err());
    }
}
