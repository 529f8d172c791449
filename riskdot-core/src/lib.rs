//! Riskdot core library - risk-band rollups for line/machine/task/step trees
//!
//! Computes, at every level of a production hierarchy, a risk-band
//! histogram, a dot priority color, recommended-action category counts,
//! and corrective-control progress, from an already-fetched snapshot.

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Rollups are strictly derived (never stored, always recomputed)
// - No global mutable state; the active matrix is threaded explicitly
// - No clock reads inside counting functions; `now` is always an argument
// - Deterministic traversal and output ordering
// - Identical input yields byte-for-byte identical output

pub mod assessment;
pub mod attribution;
pub mod band;
pub mod config;
pub mod controls;
pub mod dot;
pub mod error;
pub mod hierarchy;
pub mod matrix;
pub mod query;
pub mod report;
pub mod rollup;
pub mod summary;

pub use band::{band_of, rank_of, RiskBand};
pub use config::ResolvedConfig;
pub use controls::ControlsProgress;
pub use dot::{classify, Dot};
pub use error::{Result, RollupError};
pub use hierarchy::HierarchySnapshot;
pub use matrix::{MatrixRegistry, RiskMatrix};
pub use query::{Scope, ScopeRollup, StepFilters, StepRollup, TaskFilters};
pub use report::render_json;
