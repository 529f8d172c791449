//! Risk matrix resolution
//!
//! Maps a (severity, probability) pair to a numeric rating and a risk band
//! via a fixed lookup table. The resolver is invoked only when an
//! assessment's scores change, to (re)stamp `rating`/`band` on that
//! snapshot; the rollup engine consumes the stamped band, never raw scores.
//!
//! Global invariants enforced:
//! - Every in-domain (severity, probability) pair has exactly one cell
//! - A missing cell is a hard failure, never a default
//! - Exactly one matrix is active at a time, threaded explicitly (no
//!   process-global state)

use crate::band::RiskBand;
use crate::error::{Result, RollupError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Valid severity values (non-contiguous, domain-specific scale)
pub const SEVERITY_SCALE: [u8; 6] = [1, 2, 4, 6, 8, 10];

/// Valid probability values (same scale as severity)
pub const PROBABILITY_SCALE: [u8; 6] = [1, 2, 4, 6, 8, 10];

/// Name of the matrix seeded by default
pub const DEFAULT_MATRIX_NAME: &str = "Unilever Risk Matrix";

/// One cell of a risk matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskMatrixCell {
    pub severity: u8,
    pub probability: u8,
    pub rating: u32,
    pub band: RiskBand,
}

/// A resolved (rating, band) pair for an assessment score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRisk {
    pub rating: u32,
    pub band: RiskBand,
}

/// A named, versioned scoring table. Immutable once built.
#[derive(Debug, Clone)]
pub struct RiskMatrix {
    pub name: String,
    pub version: u32,
    cells: HashMap<(u8, u8), RiskMatrixCell>,
}

impl RiskMatrix {
    /// Build a matrix from explicit cells
    ///
    /// Rejects duplicate (severity, probability) keys and out-of-domain
    /// scores in the seed data.
    pub fn new(name: impl Into<String>, version: u32, cells: Vec<RiskMatrixCell>) -> Result<Self> {
        let mut map = HashMap::with_capacity(cells.len());
        for cell in cells {
            if !SEVERITY_SCALE.contains(&cell.severity) {
                return Err(RollupError::invalid_input(format!(
                    "cell severity {} is outside the scale",
                    cell.severity
                )));
            }
            if !PROBABILITY_SCALE.contains(&cell.probability) {
                return Err(RollupError::invalid_input(format!(
                    "cell probability {} is outside the scale",
                    cell.probability
                )));
            }
            if map.insert((cell.severity, cell.probability), cell).is_some() {
                return Err(RollupError::invalid_input(format!(
                    "duplicate matrix cell for severity {}, probability {}",
                    cell.severity, cell.probability
                )));
            }
        }
        Ok(RiskMatrix {
            name: name.into(),
            version,
            cells: map,
        })
    }

    /// The seeded default matrix: rating = severity x probability, with
    /// bands cut by rating ranges. Covers the full 6x6 score grid.
    pub fn seeded_default() -> Self {
        let mut cells = Vec::with_capacity(36);
        for &severity in &SEVERITY_SCALE {
            for &probability in &PROBABILITY_SCALE {
                let rating = u32::from(severity) * u32::from(probability);
                cells.push(RiskMatrixCell {
                    severity,
                    probability,
                    rating,
                    band: seed_band(rating),
                });
            }
        }
        // Full in-domain grid with unique keys cannot fail validation
        RiskMatrix::new(DEFAULT_MATRIX_NAME, 1, cells)
            .unwrap_or_else(|_| unreachable!("seeded grid is valid by construction"))
    }

    /// Resolve a (severity, probability) pair to its rating and band
    ///
    /// Out-of-domain scores are a caller error (`InvalidInput`); an
    /// in-domain pair with no cell is `InvalidMatrixCell`.
    pub fn resolve(&self, severity: u8, probability: u8) -> Result<ResolvedRisk> {
        if !SEVERITY_SCALE.contains(&severity) {
            return Err(RollupError::invalid_input(format!(
                "severity {} is not on the scale",
                severity
            )));
        }
        if !PROBABILITY_SCALE.contains(&probability) {
            return Err(RollupError::invalid_input(format!(
                "probability {} is not on the scale",
                probability
            )));
        }
        self.cells
            .get(&(severity, probability))
            .map(|cell| ResolvedRisk {
                rating: cell.rating,
                band: cell.band,
            })
            .ok_or(RollupError::InvalidMatrixCell {
                severity,
                probability,
            })
    }

    /// Number of cells in this matrix
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Band cut-offs for the seeded rating scale (products of two 1..=10 scores)
fn seed_band(rating: u32) -> RiskBand {
    match rating {
        0..=4 => RiskBand::VeryLow,
        5..=8 => RiskBand::Low,
        9..=16 => RiskBand::Medium,
        17..=32 => RiskBand::MediumPlus,
        33..=48 => RiskBand::High,
        _ => RiskBand::VeryHigh,
    }
}

/// Owns the set of known matrices and the "exactly one active" invariant
#[derive(Debug, Clone)]
pub struct MatrixRegistry {
    matrices: Vec<RiskMatrix>,
    active: usize,
}

impl MatrixRegistry {
    /// Build a registry with the named matrix active
    pub fn new(matrices: Vec<RiskMatrix>, active_name: &str) -> Result<Self> {
        if matrices.is_empty() {
            return Err(RollupError::invalid_input("no matrices registered"));
        }
        let active = matrices
            .iter()
            .position(|m| m.name == active_name)
            .ok_or_else(|| RollupError::not_found("matrix", active_name))?;
        Ok(MatrixRegistry { matrices, active })
    }

    /// Registry holding only the seeded default matrix
    pub fn with_seeded_default() -> Self {
        MatrixRegistry {
            matrices: vec![RiskMatrix::seeded_default()],
            active: 0,
        }
    }

    /// The single active matrix
    pub fn active(&self) -> &RiskMatrix {
        &self.matrices[self.active]
    }

    /// Switch the active matrix by name
    pub fn activate(&mut self, name: &str) -> Result<()> {
        self.active = self
            .matrices
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| RollupError::not_found("matrix", name))?;
        Ok(())
    }
}
