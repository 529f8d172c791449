//! Step summarization
//!
//! Reduces all hazard assessments on one step to its worst existing band,
//! worst predicted band, dot color, and a flag for "a high or very-high
//! hazard here has a training-type corrective action recommended".
//!
//! Global invariants enforced:
//! - Worst hazard wins (max-aggregation over ranks)
//! - A step with zero assessments is unassessed: both bands None, gray dot

use crate::band::{band_of, rank_of, RiskBand};
use crate::dot::{classify, Dot};
use crate::hierarchy::{ControlType, Step};

/// Rank at or above which a step counts as high risk (HIGH, VERY_HIGH)
pub const HIGH_RISK_RANK: u8 = 5;

/// Derived summary of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSummary {
    pub worst_existing_band: Option<RiskBand>,
    pub worst_predicted_band: Option<RiskBand>,
    pub dot: Dot,
    pub has_high_risk_training_recommendation: bool,
}

impl StepSummary {
    pub fn worst_existing_rank(&self) -> u8 {
        rank_of(self.worst_existing_band)
    }
}

/// Classify whether a control amounts to a training recommendation
///
/// The TRAINING type tag is canonical; the lowercased-description substring
/// check is a known-fuzzy fallback for older records that never set a type
/// (false positives like "restrain the guard" are possible).
pub fn is_training_recommendation(control_type: Option<ControlType>, description: &str) -> bool {
    if control_type == Some(ControlType::Training) {
        return true;
    }
    description.to_lowercase().contains("train")
}

/// Summarize all assessments attached to one step
pub fn summarize_step(step: &Step) -> StepSummary {
    let mut worst_existing_rank = 0u8;
    let mut worst_predicted_rank = 0u8;
    let mut has_training = false;

    for assessment in &step.assessments {
        let existing_rank = rank_of(assessment.existing.map(|s| s.band));
        worst_existing_rank = worst_existing_rank.max(existing_rank);
        worst_predicted_rank =
            worst_predicted_rank.max(rank_of(assessment.predicted.map(|s| s.band)));

        if existing_rank >= HIGH_RISK_RANK
            && assessment
                .additional_controls()
                .any(|c| is_training_recommendation(c.control_type, &c.description))
        {
            has_training = true;
        }
    }

    StepSummary {
        worst_existing_band: band_of(worst_existing_rank),
        worst_predicted_band: band_of(worst_predicted_rank),
        dot: classify(worst_existing_rank, worst_predicted_rank),
        has_high_risk_training_recommendation: has_training,
    }
}
