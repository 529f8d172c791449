//! Risk band ranking
//!
//! Global invariants enforced:
//! - Total order over the six bands plus "unassessed" (rank 0)
//! - Round-trip: `band_of(rank_of(Some(b))) == Some(b)` for every band
//! - Band strings match the persisted assessment `band` values exactly

use crate::error::RollupError;
use serde::{Deserialize, Serialize};

/// The six ordered risk bands, worst last
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    VeryLow,
    Low,
    Medium,
    MediumPlus,
    High,
    VeryHigh,
}

/// All bands in rank order (rank 1..=6)
pub const ALL_BANDS: [RiskBand; 6] = [
    RiskBand::VeryLow,
    RiskBand::Low,
    RiskBand::Medium,
    RiskBand::MediumPlus,
    RiskBand::High,
    RiskBand::VeryHigh,
];

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::VeryLow => "VERY_LOW",
            RiskBand::Low => "LOW",
            RiskBand::Medium => "MEDIUM",
            RiskBand::MediumPlus => "MEDIUM_PLUS",
            RiskBand::High => "HIGH",
            RiskBand::VeryHigh => "VERY_HIGH",
        }
    }

    /// Rank of this band, 1 (VERY_LOW) through 6 (VERY_HIGH)
    pub fn rank(&self) -> u8 {
        match self {
            RiskBand::VeryLow => 1,
            RiskBand::Low => 2,
            RiskBand::Medium => 3,
            RiskBand::MediumPlus => 4,
            RiskBand::High => 5,
            RiskBand::VeryHigh => 6,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskBand {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERY_LOW" => Ok(RiskBand::VeryLow),
            "LOW" => Ok(RiskBand::Low),
            "MEDIUM" => Ok(RiskBand::Medium),
            "MEDIUM_PLUS" => Ok(RiskBand::MediumPlus),
            "HIGH" => Ok(RiskBand::High),
            "VERY_HIGH" => Ok(RiskBand::VeryHigh),
            other => Err(RollupError::invalid_input(format!(
                "unknown risk band: {}",
                other
            ))),
        }
    }
}

/// Rank of an optional band; unassessed (None) maps to 0
pub fn rank_of(band: Option<RiskBand>) -> u8 {
    band.map(|b| b.rank()).unwrap_or(0)
}

/// Inverse of [`rank_of`]: 0 maps back to None, 1..=6 to the band
///
/// Ranks above 6 do not occur in practice; they map to None.
pub fn band_of(rank: u8) -> Option<RiskBand> {
    match rank {
        1 => Some(RiskBand::VeryLow),
        2 => Some(RiskBand::Low),
        3 => Some(RiskBand::Medium),
        4 => Some(RiskBand::MediumPlus),
        5 => Some(RiskBand::High),
        6 => Some(RiskBand::VeryHigh),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_round_trip() {
        for band in ALL_BANDS {
            assert_eq!(band_of(rank_of(Some(band))), Some(band));
        }
        for rank in 1..=6u8 {
            assert_eq!(rank_of(band_of(rank)), rank);
        }
    }

    #[test]
    fn test_unassessed_rank_is_zero() {
        assert_eq!(rank_of(None), 0);
        assert_eq!(band_of(0), None);
    }

    #[test]
    fn test_band_order_matches_rank_order() {
        for pair in ALL_BANDS.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_string_round_trip() {
        for band in ALL_BANDS {
            let parsed: RiskBand = band.as_str().parse().unwrap();
            assert_eq!(parsed, band);
        }
    }

    #[test]
    fn test_unknown_band_string_rejected() {
        let result: Result<RiskBand, _> = "EXTREME".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&RiskBand::MediumPlus).unwrap();
        assert_eq!(json, "\"MEDIUM_PLUS\"");
        let band: RiskBand = serde_json::from_str("\"VERY_HIGH\"").unwrap();
        assert_eq!(band, RiskBand::VeryHigh);
    }
}
