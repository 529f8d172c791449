//! Per-scope rollup reduction
//!
//! Buckets a scope's step set by risk band and dot color, and sums the
//! recommended-category attribution for its high-risk steps.
//!
//! Global invariants enforced:
//! - Rollups are strictly derived (never stored, always recomputed)
//! - Counts are conserved across levels: summing each bucket over a line's
//!   machines equals the line-level bucket
//! - A scope with zero steps yields all-zero counts, not an omitted entry

use crate::attribution::step_categories;
use crate::dot::Dot;
use crate::hierarchy::Step;
use crate::summary::{summarize_step, StepSummary, HIGH_RISK_RANK};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Histogram of steps by worst-existing band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskCounts {
    pub total: usize,
    pub unassessed: usize,
    pub very_low: usize,
    pub low: usize,
    pub medium: usize,
    pub medium_plus: usize,
    pub high: usize,
    pub very_high: usize,
}

impl RiskCounts {
    fn record(&mut self, rank: u8) {
        self.total += 1;
        match rank {
            0 => self.unassessed += 1,
            1 => self.very_low += 1,
            2 => self.low += 1,
            3 => self.medium += 1,
            4 => self.medium_plus += 1,
            5 => self.high += 1,
            _ => self.very_high += 1,
        }
    }
}

/// Histogram of steps by dot color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DotCounts {
    pub gray: usize,
    pub green: usize,
    pub yellow: usize,
    pub orange: usize,
    pub red: usize,
}

impl DotCounts {
    fn record(&mut self, dot: Dot) {
        match dot {
            Dot::Gray => self.gray += 1,
            Dot::Green => self.green += 1,
            Dot::Yellow => self.yellow += 1,
            Dot::Orange => self.orange += 1,
            Dot::Red => self.red += 1,
        }
    }
}

/// Category id -> count of high-risk steps recommending that category.
/// BTreeMap keeps serialization order deterministic.
pub type CategoryCounts = BTreeMap<String, usize>;

/// Full derived rollup for one scope's step set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScopeCounts {
    pub counts: RiskCounts,
    pub dots: DotCounts,
    pub high_risk_recommended_category_counts: CategoryCounts,
}

/// Reduce a step set into its rollup
///
/// Category attribution only counts steps whose worst-existing rank is HIGH
/// or above; lower-risk steps contribute nothing even when they carry
/// recommended actions.
pub fn rollup_steps<'a>(steps: impl IntoIterator<Item = &'a Step>) -> ScopeCounts {
    let mut rollup = ScopeCounts::default();

    for step in steps {
        let summary: StepSummary = summarize_step(step);
        let rank = summary.worst_existing_rank();

        rollup.counts.record(rank);
        rollup.dots.record(summary.dot);

        if rank >= HIGH_RISK_RANK {
            for category in step_categories(step) {
                *rollup
                    .high_risk_recommended_category_counts
                    .entry(category)
                    .or_insert(0) += 1;
            }
        }
    }

    rollup
}
