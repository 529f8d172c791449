//! Assessment (re)scoring
//!
//! Updates arrive as explicit per-field patches rather than loose partial
//! objects: each field is tagged `Keep` (omitted), `Clear` (explicit null),
//! or `Set`. After the merge, any side whose severity and probability are
//! both present is re-stamped with rating/band from the active matrix; a
//! side with both absent is unset. This is the only place the resolver is
//! invoked.

use crate::error::{Result, RollupError};
use crate::hierarchy::{Assessment, ScoredRisk};
use crate::matrix::RiskMatrix;

/// One field of an update request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPatch<T> {
    /// Field omitted from the request: no change
    #[default]
    Keep,
    /// Explicit null: clear the field
    Clear,
    /// Replace the field with a new value
    Set(T),
}

impl<T: Copy> FieldPatch<T> {
    fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            FieldPatch::Keep => current,
            FieldPatch::Clear => None,
            FieldPatch::Set(value) => Some(value),
        }
    }
}

/// Update request for the scored fields of an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssessmentPatch {
    pub existing_severity: FieldPatch<u8>,
    pub existing_probability: FieldPatch<u8>,
    pub predicted_severity: FieldPatch<u8>,
    pub predicted_probability: FieldPatch<u8>,
}

/// Apply a patch to an assessment, re-stamping rating/band through `matrix`
///
/// A side left with severity but not probability (or vice versa) is
/// rejected: a score snapshot is either fully set or fully unset.
pub fn apply_patch(
    assessment: &mut Assessment,
    patch: &AssessmentPatch,
    matrix: &RiskMatrix,
) -> Result<()> {
    let existing = merge_side(
        "existing",
        assessment.existing,
        patch.existing_severity,
        patch.existing_probability,
        matrix,
    )?;
    let predicted = merge_side(
        "predicted",
        assessment.predicted,
        patch.predicted_severity,
        patch.predicted_probability,
        matrix,
    )?;

    assessment.existing = existing;
    assessment.predicted = predicted;
    Ok(())
}

fn merge_side(
    side: &str,
    current: Option<ScoredRisk>,
    severity_patch: FieldPatch<u8>,
    probability_patch: FieldPatch<u8>,
    matrix: &RiskMatrix,
) -> Result<Option<ScoredRisk>> {
    let severity = severity_patch.apply(current.map(|s| s.severity));
    let probability = probability_patch.apply(current.map(|s| s.probability));

    match (severity, probability) {
        (Some(severity), Some(probability)) => {
            let resolved = matrix.resolve(severity, probability)?;
            Ok(Some(ScoredRisk {
                severity,
                probability,
                rating: resolved.rating,
                band: resolved.band,
            }))
        }
        (None, None) => Ok(None),
        _ => Err(RollupError::invalid_input(format!(
            "{} score must set severity and probability together",
            side
        ))),
    }
}
