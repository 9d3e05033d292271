//! Compact command-line syntax for pattern steps.
//!
//! ```text
//! red | black | green | even | odd | low | high
//! d1 d2 d3 (dozens)      c1 c2 c3 (columns)
//! 17 | 00 | n:17         single number
//! set:1,2,3              number set
//! nb:17:2                17 and two pockets each side
//! target:5,8/10,20       base numbers / target numbers
//! every:3:red[:all]      cyclical; `:all` re-arms on every trigger
//! ```

use wheelwatch_core::{
    Color, Column, Cyclical, Dozen, Neighbors, Parity, Pattern, Range, Spin, Step, TargetNumbers,
};

pub fn parse_pattern(tokens: &[String]) -> Result<Pattern, String> {
    let steps = tokens
        .iter()
        .map(|t| parse_step(t))
        .collect::<Result<Vec<_>, _>>()?;
    Pattern::new(steps).map_err(|e| e.to_string())
}

pub fn parse_step(token: &str) -> Result<Step, String> {
    let lower = token.trim().to_ascii_lowercase();
    let step = match lower.as_str() {
        "red" => Step::Color(Color::Red),
        "black" => Step::Color(Color::Black),
        "green" => Step::Color(Color::Green),
        "even" => Step::Parity(Parity::Even),
        "odd" => Step::Parity(Parity::Odd),
        "low" => Step::Range(Range::Low),
        "high" => Step::Range(Range::High),
        "d1" => Step::Dozen(Dozen::First),
        "d2" => Step::Dozen(Dozen::Second),
        "d3" => Step::Dozen(Dozen::Third),
        "c1" => Step::Column(Column::First),
        "c2" => Step::Column(Column::Second),
        "c3" => Step::Column(Column::Third),
        other => return parse_compound(other),
    };
    Ok(step)
}

fn parse_compound(token: &str) -> Result<Step, String> {
    if let Some(rest) = token.strip_prefix("every:") {
        let (interval, inner) = rest
            .split_once(':')
            .ok_or_else(|| format!("expected every:<interval>:<step>, got {token:?}"))?;
        let (inner, ignore_subsequent) = match inner.strip_suffix(":all") {
            Some(inner) => (inner, false),
            None => (inner, true),
        };
        let interval = interval
            .parse::<u32>()
            .map_err(|e| format!("bad interval {interval:?}: {e}"))?;
        return Ok(Step::Cyclical(Cyclical {
            target: Box::new(parse_step(inner)?),
            interval,
            ignore_subsequent,
        }));
    }
    if let Some(rest) = token.strip_prefix("target:") {
        let (base, targets) = rest
            .split_once('/')
            .ok_or_else(|| format!("expected target:<base>/<targets>, got {token:?}"))?;
        return Ok(Step::TargetNumbers(TargetNumbers {
            base: parse_list(base)?,
            targets: parse_list(targets)?,
        }));
    }
    if let Some(rest) = token.strip_prefix("nb:") {
        let (center, radius) = rest
            .split_once(':')
            .ok_or_else(|| format!("expected nb:<center>:<radius>, got {token:?}"))?;
        return Ok(Step::Neighbors(Neighbors {
            center: parse_spin(center)?,
            radius: radius
                .parse()
                .map_err(|e| format!("bad radius {radius:?}: {e}"))?,
        }));
    }
    if let Some(rest) = token.strip_prefix("set:") {
        return Ok(Step::NumberSet(parse_list(rest)?));
    }
    let number = token.strip_prefix("n:").unwrap_or(token);
    parse_spin(number)
        .map(Step::SingleNumber)
        .map_err(|_| format!("unrecognised step {token:?}"))
}

fn parse_spin(s: &str) -> Result<Spin, String> {
    s.trim().parse::<Spin>().map_err(|e| e.to_string())
}

fn parse_list(s: &str) -> Result<Vec<Spin>, String> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_spin)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin(v: u8) -> Spin {
        Spin::new(v).unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(parse_step("RED"), Ok(Step::Color(Color::Red)));
        assert_eq!(parse_step("d2"), Ok(Step::Dozen(Dozen::Second)));
        assert_eq!(parse_step("00"), Ok(Step::SingleNumber(Spin::DOUBLE_ZERO)));
        assert_eq!(parse_step("n:17"), Ok(Step::SingleNumber(spin(17))));
    }

    #[test]
    fn test_compound_tokens() {
        assert_eq!(
            parse_step("nb:0:2"),
            Ok(Step::Neighbors(Neighbors {
                center: spin(0),
                radius: 2
            }))
        );
        assert_eq!(
            parse_step("target:5,8/10"),
            Ok(Step::TargetNumbers(TargetNumbers {
                base: vec![spin(5), spin(8)],
                targets: vec![spin(10)],
            }))
        );
        assert_eq!(
            parse_step("every:3:n:17:all"),
            Ok(Step::Cyclical(Cyclical {
                target: Box::new(Step::SingleNumber(spin(17))),
                interval: 3,
                ignore_subsequent: false,
            }))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_step("purple").is_err());
        assert!(parse_step("n:40").is_err());
        assert!(parse_step("every:x:red").is_err());
        assert!(parse_pattern(&["every:2:red".into(), "odd".into()]).is_err());
    }
}
