//! Dot classification - the five-color priority triage signal
//!
//! Derives a single color from the pair (worst current rank, worst predicted
//! rank). Orange specifically flags "high risk, but the mitigation plan would
//! bring it down to MEDIUM or below"; red means no adequate plan yet. The
//! thresholds are asymmetric on purpose (current splits at 4/5, predicted at
//! 3/4) and are a fixed business rule, reproduced exactly.

use crate::error::RollupError;
use serde::{Deserialize, Serialize};

/// Priority dot color
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dot {
    Gray,
    Green,
    Yellow,
    Orange,
    Red,
}

/// All dot colors in severity order
pub const ALL_DOTS: [Dot; 5] = [Dot::Gray, Dot::Green, Dot::Yellow, Dot::Orange, Dot::Red];

impl Dot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dot::Gray => "gray",
            Dot::Green => "green",
            Dot::Yellow => "yellow",
            Dot::Orange => "orange",
            Dot::Red => "red",
        }
    }
}

impl std::fmt::Display for Dot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dot {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gray" => Ok(Dot::Gray),
            "green" => Ok(Dot::Green),
            "yellow" => Ok(Dot::Yellow),
            "orange" => Ok(Dot::Orange),
            "red" => Ok(Dot::Red),
            other => Err(RollupError::invalid_input(format!(
                "unknown dot color: {}",
                other
            ))),
        }
    }
}

/// Classify a (current rank, predicted rank) pair into a dot color
///
/// Rules, in order:
/// 1. current 0 (unassessed) -> gray
/// 2. current 1 (VERY_LOW) -> green
/// 3. current 2..4 (LOW..MEDIUM_PLUS) -> yellow
/// 4. current 5..6 (HIGH/VERY_HIGH) with predicted 1..3 -> orange
/// 5. otherwise -> red
///
/// Predicted rank 0 (unscored) never satisfies rule 4, so a HIGH step whose
/// mitigation has not been scored yet stays red.
pub fn classify(current_rank: u8, predicted_rank: u8) -> Dot {
    match current_rank {
        0 => Dot::Gray,
        1 => Dot::Green,
        2..=4 => Dot::Yellow,
        _ => {
            if (1..=3).contains(&predicted_rank) {
                Dot::Orange
            } else {
                Dot::Red
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassessed_is_gray_regardless_of_predicted() {
        for predicted in 0..=6 {
            assert_eq!(classify(0, predicted), Dot::Gray);
        }
    }

    #[test]
    fn test_very_low_is_green_regardless_of_predicted() {
        for predicted in 0..=6 {
            assert_eq!(classify(1, predicted), Dot::Green);
        }
    }

    #[test]
    fn test_low_through_medium_plus_is_yellow() {
        for current in 2..=4 {
            for predicted in 0..=6 {
                assert_eq!(classify(current, predicted), Dot::Yellow);
            }
        }
    }

    #[test]
    fn test_high_with_mitigated_prediction_is_orange() {
        for current in 5..=6 {
            for predicted in 1..=3 {
                assert_eq!(classify(current, predicted), Dot::Orange);
            }
        }
    }

    #[test]
    fn test_high_without_mitigation_is_red() {
        // Predicted 0 (unscored) and 4..6 (still MEDIUM_PLUS or worse) are
        // both "no adequate plan".
        for current in 5..=6 {
            assert_eq!(classify(current, 0), Dot::Red);
            for predicted in 4..=6 {
                assert_eq!(classify(current, predicted), Dot::Red);
            }
        }
    }

    #[test]
    fn test_very_high_with_very_low_prediction_is_orange() {
        // Rank 6 takes the same predicted-rank test as rank 5.
        assert_eq!(classify(6, 1), Dot::Orange);
    }

    #[test]
    fn test_dot_string_round_trip() {
        for dot in ALL_DOTS {
            let parsed: Dot = dot.as_str().parse().unwrap();
            assert_eq!(parsed, dot);
        }
        let result: Result<Dot, _> = "purple".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Dot::Orange).unwrap(), "\"orange\"");
    }
}
