//! Hierarchy snapshot - the external data shapes the engine computes over
//!
//! A `HierarchySnapshot` is an already-fetched, immutable view of the
//! Line -> Machine -> Task -> Step containment tree, with hazard assessments
//! and their controls attached to steps. The surrounding system fetches one
//! per request; the engine performs no I/O of its own beyond the JSON
//! (de)serialization helpers here.
//!
//! Global invariants enforced:
//! - Strict containment, no cross-links (a step has exactly one task, etc.)
//! - Schema version checked on load
//! - Deterministic serialization

use crate::band::RiskBand;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version for hierarchy snapshots
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// A fully resolved risk score on one side of an assessment.
/// Either all four fields are present or the whole score is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoredRisk {
    pub severity: u8,
    pub probability: u8,
    pub rating: u32,
    pub band: RiskBand,
}

/// Corrective-action phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlPhase {
    Existing,
    Additional,
}

/// Hierarchy-of-controls type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    Elimination,
    Substitution,
    Engineering,
    Administrative,
    Training,
    Ppe,
}

/// Implementation status of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlStatus {
    Proposed,
    InProgress,
    Implemented,
}

/// A corrective action attached to an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Control {
    pub id: String,
    pub description: String,
    pub phase: ControlPhase,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub control_type: Option<ControlType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<DateTime<Utc>>,
    pub status: ControlStatus,
    /// Legacy signal: a non-null verification timestamp also means "done"
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// A hazard attached to a step, with its two independent risk snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Assessment {
    pub id: String,
    pub hazard: String,
    /// Risk before additional controls; None means not yet scored
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub existing: Option<ScoredRisk>,
    /// Risk after proposed controls are implemented; None means not yet scored
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub predicted: Option<ScoredRisk>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub controls: Vec<Control>,
}

impl Assessment {
    /// Controls in the ADDITIONAL phase (the only ones tracked for
    /// attribution and progress)
    pub fn additional_controls(&self) -> impl Iterator<Item = &Control> {
        self.controls
            .iter()
            .filter(|c| c.phase == ControlPhase::Additional)
    }
}

/// One step of a task, ordered by `step_no`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Step {
    pub id: String,
    pub step_no: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub assessments: Vec<Assessment>,
}

/// A task on a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phase_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub steps: Vec<Step>,
}

/// A machine on a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Machine {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tasks: Vec<Task>,
}

impl Machine {
    /// All steps transitively under this machine, in tree order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.tasks.iter().flat_map(|t| t.steps.iter())
    }
}

/// A production line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Line {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub machines: Vec<Machine>,
}

impl Line {
    /// All steps transitively under this line, in tree order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.machines.iter().flat_map(|m| m.steps())
    }
}

/// Immutable snapshot of the whole hierarchy for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HierarchySnapshot {
    #[serde(rename = "schema_version")]
    pub schema_version: u32,
    pub lines: Vec<Line>,
}

impl HierarchySnapshot {
    pub fn new(lines: Vec<Line>) -> Self {
        HierarchySnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            lines,
        }
    }

    /// Find a line by id
    pub fn line(&self, line_id: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Find a machine by id, with its owning line
    pub fn machine(&self, machine_id: &str) -> Option<(&Line, &Machine)> {
        self.lines.iter().find_map(|line| {
            line.machines
                .iter()
                .find(|m| m.id == machine_id)
                .map(|m| (line, m))
        })
    }

    /// Find a task by id, with its owning line and machine
    pub fn task(&self, task_id: &str) -> Option<(&Line, &Machine, &Task)> {
        self.lines.iter().find_map(|line| {
            line.machines.iter().find_map(|machine| {
                machine
                    .tasks
                    .iter()
                    .find(|t| t.id == task_id)
                    .map(|t| (line, machine, t))
            })
        })
    }

    /// Serialize to pretty JSON (deterministic field ordering)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize hierarchy snapshot")
    }

    /// Deserialize from JSON, validating the schema version
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: HierarchySnapshot =
            serde_json::from_str(json).context("failed to deserialize hierarchy snapshot")?;

        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            anyhow::bail!(
                "snapshot schema version mismatch: expected {}, got {}",
                SNAPSHOT_SCHEMA_VERSION,
                snapshot.schema_version
            );
        }

        Ok(snapshot)
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Write data to a file atomically using temp file + rename
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = std::fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))?;
    drop(file);

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
