//! Additional-control implementation progress
//!
//! Counts total/implemented/overdue/open over the ADDITIONAL controls in a
//! scope, against a caller-supplied `now` (never a clock read inside the
//! counting).

use crate::hierarchy::{Control, ControlPhase, ControlStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a control counts as done
///
/// Two independent signals represent the same fact: the status enum is
/// canonical, the verification timestamp is a compatibility fallback for
/// older records. Either alone suffices (OR, not a consistency check).
pub fn is_implemented(status: ControlStatus, verified_at: Option<DateTime<Utc>>) -> bool {
    status == ControlStatus::Implemented || verified_at.is_some()
}

/// Progress counts for the ADDITIONAL controls under one scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ControlsProgress {
    pub total: usize,
    pub implemented: usize,
    pub overdue: usize,
    pub open: usize,
}

/// Count progress over a control set, evaluated at `now`
///
/// Controls outside the ADDITIONAL phase are ignored regardless of what the
/// caller passes in. `overdue` counts unimplemented controls whose due date
/// has passed; `open` is `total - implemented`.
pub fn count_progress<'a>(
    controls: impl IntoIterator<Item = &'a Control>,
    now: DateTime<Utc>,
) -> ControlsProgress {
    let mut progress = ControlsProgress::default();

    for control in controls {
        if control.phase != ControlPhase::Additional {
            continue;
        }
        progress.total += 1;
        if is_implemented(control.status, control.verified_at) {
            progress.implemented += 1;
        } else if control.due_date.is_some_and(|due| due < now) {
            progress.overdue += 1;
        }
    }

    progress.open = progress.total - progress.implemented;
    progress
}
