//! Descriptive statistics over a spin stream: frequencies, hot/cold numbers,
//! "due" counters and follower analysis. None of it feeds the matching engine.

use std::collections::HashMap;

use serde::Serialize;

use crate::spin::{Column, Dozen, Range, Spin, WheelVariant};
use crate::stream::SpinStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberCount {
    pub number: Spin,
    pub count: usize,
}

/// Spins elapsed since a board section last hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueCounter {
    pub section: String,
    pub spins_since: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Follower {
    pub number: Spin,
    pub count: usize,
    pub percentage: f64,
}

/// Occurrence count for every pocket of the wheel, in numeric order.
pub fn frequencies(stream: &SpinStream, variant: WheelVariant) -> Vec<NumberCount> {
    let mut counts: Vec<NumberCount> = variant
        .pockets()
        .map(|number| NumberCount { number, count: 0 })
        .collect();
    for spin in stream.iter_newest_first() {
        match counts.iter_mut().find(|c| c.number == spin) {
            Some(c) => c.count += 1,
            // A 00 recorded while the European wheel is selected.
            None => counts.push(NumberCount { number: spin, count: 1 }),
        }
    }
    counts
}

/// The `n` most frequent numbers; ties keep numeric order.
pub fn hot_numbers(stream: &SpinStream, variant: WheelVariant, n: usize) -> Vec<NumberCount> {
    let mut counts = frequencies(stream, variant);
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

/// The `n` least frequent numbers.
///
/// Numbers never seen are only listed when at most `n` distinct numbers
/// have appeared.
pub fn cold_numbers(stream: &SpinStream, variant: WheelVariant, n: usize) -> Vec<NumberCount> {
    let counts = frequencies(stream, variant);
    let seen: Vec<NumberCount> = counts.iter().copied().filter(|c| c.count > 0).collect();
    let mut pool = if seen.len() > n { seen } else { counts };
    pool.sort_by(|a, b| a.count.cmp(&b.count));
    pool.truncate(n);
    pool
}

/// Spins since each dozen, column and range last hit. A section that never
/// hit reports the full stream length.
pub fn due_counters(stream: &SpinStream) -> Vec<DueCounter> {
    let since = |pred: &dyn Fn(Spin) -> bool| -> usize {
        stream
            .iter_newest_first()
            .position(pred)
            .unwrap_or(stream.len())
    };

    let mut out = Vec::with_capacity(8);
    for (name, d) in [
        ("1st dozen", Dozen::First),
        ("2nd dozen", Dozen::Second),
        ("3rd dozen", Dozen::Third),
    ] {
        out.push(DueCounter {
            section: name.into(),
            spins_since: since(&|s: Spin| s.dozen() == Some(d)),
        });
    }
    for (name, c) in [
        ("1st column", Column::First),
        ("2nd column", Column::Second),
        ("3rd column", Column::Third),
    ] {
        out.push(DueCounter {
            section: name.into(),
            spins_since: since(&|s: Spin| s.column() == Some(c)),
        });
    }
    for (name, r) in [("Low (1-18)", Range::Low), ("High (19-36)", Range::High)] {
        out.push(DueCounter {
            section: name.into(),
            spins_since: since(&|s: Spin| s.range() == Some(r)),
        });
    }
    out
}

/// Which numbers most often came right after `number`, top `n` by count.
pub fn followers(stream: &SpinStream, number: Spin, n: usize) -> Vec<Follower> {
    let chronological = stream.to_oldest_first();
    let mut counts: HashMap<Spin, usize> = HashMap::new();
    let mut occurrences = 0usize;

    for pair in chronological.windows(2) {
        if pair[0] == number {
            occurrences += 1;
            *counts.entry(pair[1]).or_default() += 1;
        }
    }
    if occurrences == 0 {
        return Vec::new();
    }

    let mut out: Vec<Follower> = counts
        .into_iter()
        .map(|(follower, count)| Follower {
            number: follower,
            count,
            percentage: count as f64 / occurrences as f64 * 100.0,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(oldest_first: &[u8]) -> SpinStream {
        SpinStream::from_oldest_first(oldest_first.iter().map(|&v| Spin::new(v).unwrap()))
    }

    fn spin(v: u8) -> Spin {
        Spin::new(v).unwrap()
    }

    #[test]
    fn test_frequencies_cover_wheel() {
        let s = stream(&[1, 1, 37]);
        let eu = frequencies(&s, WheelVariant::European);
        // 00 is appended after the 37 European pockets
        assert_eq!(eu.len(), 38);
        assert_eq!(eu[1].count, 2);
        let us = frequencies(&s, WheelVariant::American);
        assert_eq!(us.len(), 38);
        assert_eq!(us[37].count, 1);
    }

    #[test]
    fn test_hot_numbers() {
        let s = stream(&[5, 5, 5, 9, 9, 2]);
        let hot = hot_numbers(&s, WheelVariant::European, 2);
        assert_eq!(hot[0], NumberCount { number: spin(5), count: 3 });
        assert_eq!(hot[1], NumberCount { number: spin(9), count: 2 });
    }

    #[test]
    fn test_cold_numbers_prefers_seen() {
        let s = stream(&[1, 2, 2, 3, 3, 3]);
        // only 3 distinct numbers seen, not more than n -> unseen numbers lead
        let cold = cold_numbers(&s, WheelVariant::European, 5);
        assert_eq!(cold.len(), 5);
        assert!(cold.iter().all(|c| c.count == 0));

        let cold = cold_numbers(&s, WheelVariant::European, 2);
        assert_eq!(
            cold,
            vec![
                NumberCount { number: spin(1), count: 1 },
                NumberCount { number: spin(2), count: 2 },
            ]
        );
    }

    #[test]
    fn test_due_counters() {
        // newest first: 25, 0, 3
        let s = stream(&[3, 0, 25]);
        let due = due_counters(&s);
        let get = |name: &str| due.iter().find(|d| d.section == name).unwrap().spins_since;
        assert_eq!(get("3rd dozen"), 0);
        assert_eq!(get("1st dozen"), 2);
        assert_eq!(get("2nd dozen"), 3);
        assert_eq!(get("3rd column"), 2);
        assert_eq!(get("1st column"), 0);
        assert_eq!(get("High (19-36)"), 0);
        assert_eq!(get("Low (1-18)"), 2);
    }

    #[test]
    fn test_followers() {
        let s = stream(&[7, 1, 7, 1, 7, 2, 7]);
        let f = followers(&s, spin(7), 5);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].number, spin(1));
        assert_eq!(f[0].count, 2);
        assert!((f[0].percentage - 200.0 / 3.0).abs() < 1e-10);
        assert!(followers(&s, spin(30), 5).is_empty());
    }
}
