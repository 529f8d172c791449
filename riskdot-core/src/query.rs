//! Rollup query surfaces
//!
//! Four read-style queries (lines, machines-for-line, tasks-for-machine,
//! steps-for-task) plus recommendations and scope progress, all computed
//! from a `HierarchySnapshot` with no caching. Per-child rollups are
//! independent pure reductions and run on rayon; the order-preserving
//! collect keeps results identical to sequential evaluation.
//!
//! Failure semantics: a scope id that does not resolve aborts the whole
//! query with `NotFound`; partial results are never returned.

use crate::band::RiskBand;
use crate::controls::{count_progress, is_implemented, ControlsProgress};
use crate::dot::Dot;
use crate::error::{Result, RollupError};
use crate::hierarchy::{
    Control, ControlType, HierarchySnapshot, Line, Machine, Step, Task,
};
use crate::rollup::{rollup_steps, CategoryCounts, DotCounts, RiskCounts};
use crate::summary::summarize_step;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A rollup scope: one line, machine, or task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Line(String),
    Machine(String),
    Task(String),
}

/// Rollup row for one line/machine/task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScopeRollup {
    pub id: String,
    pub name: String,
    pub counts: RiskCounts,
    pub dots: DotCounts,
    pub high_risk_recommended_category_counts: CategoryCounts,
    pub additional_controls: ControlsProgress,
}

/// Optional filters for the tasks query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub task_category_id: Option<String>,
    pub task_phase_id: Option<String>,
}

impl TaskFilters {
    fn matches(&self, task: &Task) -> bool {
        if let Some(ref category) = self.task_category_id {
            if task.category_id.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(ref phase) = self.task_phase_id {
            if task.phase_id.as_ref() != Some(phase) {
                return false;
            }
        }
        true
    }
}

/// Optional post-filters for the steps query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepFilters {
    pub dot: Option<Dot>,
    pub category_id: Option<String>,
}

/// Rollup row for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StepRollup {
    pub id: String,
    pub step_no: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_band: Option<RiskBand>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub predicted_band: Option<RiskBand>,
    pub dot: Dot,
    pub has_high_risk_training_recommendation: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub recommended_action_category_ids: Vec<String>,
}

/// Where a recommended control lives in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ControlLocation {
    pub line: String,
    pub machine: String,
    pub task: String,
    pub step_no: u32,
    pub step: String,
}

/// One open ADDITIONAL control, with its resolved location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendedControl {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub control_type: Option<ControlType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<DateTime<Utc>>,
    pub overdue: bool,
    pub location: ControlLocation,
}

/// All open recommendations for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryRecommendations {
    /// None groups controls that never got a category
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_id: Option<String>,
    pub total: usize,
    pub controls: Vec<RecommendedControl>,
}

/// Open ADDITIONAL controls across a scope, grouped by category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationsReport {
    pub total_open: usize,
    pub categories: Vec<CategoryRecommendations>,
}

/// Rollup for every line
pub fn lines_rollup(snapshot: &HierarchySnapshot, now: DateTime<Utc>) -> Vec<ScopeRollup> {
    snapshot
        .lines
        .par_iter()
        .map(|line| build_scope_rollup(&line.id, &line.name, line.steps().collect(), now))
        .collect()
}

/// Rollup for every machine under one line
pub fn machines_for_line(
    snapshot: &HierarchySnapshot,
    line_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ScopeRollup>> {
    let line = snapshot
        .line(line_id)
        .ok_or_else(|| RollupError::not_found("line", line_id))?;

    // Every machine gets a row, zero steps or not; siblings never share
    // buckets because each reduction sees only its own subtree.
    Ok(line
        .machines
        .par_iter()
        .map(|machine| {
            build_scope_rollup(&machine.id, &machine.name, machine.steps().collect(), now)
        })
        .collect())
}

/// Rollup for every task under one machine, with optional attribute filters
pub fn tasks_for_machine(
    snapshot: &HierarchySnapshot,
    machine_id: &str,
    filters: &TaskFilters,
    now: DateTime<Utc>,
) -> Result<Vec<ScopeRollup>> {
    let (_, machine) = snapshot
        .machine(machine_id)
        .ok_or_else(|| RollupError::not_found("machine", machine_id))?;

    Ok(machine
        .tasks
        .par_iter()
        .filter(|task| filters.matches(task))
        .map(|task| build_scope_rollup(&task.id, &task.name, task.steps.iter().collect(), now))
        .collect())
}

/// Per-step rollup for one task, with dot/category post-filters
///
/// Filters are applied after dot and categories are computed; a step is
/// included only if it matches every provided filter. The category list
/// reflects all recommended actions on the step; the high-risk threshold
/// applies only to the aggregate counts, not to this listing.
pub fn steps_for_task(
    snapshot: &HierarchySnapshot,
    task_id: &str,
    filters: &StepFilters,
) -> Result<Vec<StepRollup>> {
    let (_, _, task) = snapshot
        .task(task_id)
        .ok_or_else(|| RollupError::not_found("task", task_id))?;

    let mut rows: Vec<StepRollup> = task
        .steps
        .iter()
        .map(|step| {
            let summary = summarize_step(step);
            StepRollup {
                id: step.id.clone(),
                step_no: step.step_no,
                title: step.title.clone(),
                current_band: summary.worst_existing_band,
                predicted_band: summary.worst_predicted_band,
                dot: summary.dot,
                has_high_risk_training_recommendation: summary
                    .has_high_risk_training_recommendation,
                recommended_action_category_ids: crate::attribution::step_categories(step)
                    .into_iter()
                    .collect(),
            }
        })
        .filter(|row| {
            if let Some(dot) = filters.dot {
                if row.dot != dot {
                    return false;
                }
            }
            if let Some(ref category) = filters.category_id {
                if !row
                    .recommended_action_category_ids
                    .iter()
                    .any(|c| c == category)
                {
                    return false;
                }
            }
            true
        })
        .collect();

    rows.sort_by_key(|row| row.step_no);
    Ok(rows)
}

/// Control progress for an arbitrary scope
pub fn scope_progress(
    snapshot: &HierarchySnapshot,
    scope: &Scope,
    now: DateTime<Utc>,
) -> Result<ControlsProgress> {
    let steps = scope_steps(snapshot, scope)?;
    Ok(count_progress(controls_of(&steps), now))
}

/// Open ADDITIONAL controls across a scope, grouped by category with
/// resolved line/machine/task/step locations
pub fn recommendations(
    snapshot: &HierarchySnapshot,
    scope: &Scope,
    now: DateTime<Utc>,
) -> Result<RecommendationsReport> {
    let located = located_steps(snapshot, scope)?;

    let mut groups: BTreeMap<Option<String>, Vec<RecommendedControl>> = BTreeMap::new();
    let mut total_open = 0usize;

    for entry in &located {
        for assessment in &entry.step.assessments {
            for control in assessment.additional_controls() {
                if is_implemented(control.status, control.verified_at) {
                    continue;
                }
                total_open += 1;
                groups
                    .entry(control.category_id.clone())
                    .or_default()
                    .push(RecommendedControl {
                        id: control.id.clone(),
                        description: control.description.clone(),
                        control_type: control.control_type,
                        due_date: control.due_date,
                        overdue: control.due_date.is_some_and(|due| due < now),
                        location: ControlLocation {
                            line: entry.line.name.clone(),
                            machine: entry.machine.name.clone(),
                            task: entry.task.name.clone(),
                            step_no: entry.step.step_no,
                            step: entry.step.title.clone(),
                        },
                    });
            }
        }
    }

    let categories = groups
        .into_iter()
        .map(|(category_id, controls)| CategoryRecommendations {
            category_id,
            total: controls.len(),
            controls,
        })
        .collect();

    Ok(RecommendationsReport {
        total_open,
        categories,
    })
}

/// One step with its resolved ancestors
struct LocatedStep<'a> {
    line: &'a Line,
    machine: &'a Machine,
    task: &'a Task,
    step: &'a Step,
}

fn located_steps<'a>(
    snapshot: &'a HierarchySnapshot,
    scope: &Scope,
) -> Result<Vec<LocatedStep<'a>>> {
    let mut out = Vec::new();
    match scope {
        Scope::Line(id) => {
            let line = snapshot
                .line(id)
                .ok_or_else(|| RollupError::not_found("line", id.clone()))?;
            for machine in &line.machines {
                push_machine_steps(line, machine, &mut out);
            }
        }
        Scope::Machine(id) => {
            let (line, machine) = snapshot
                .machine(id)
                .ok_or_else(|| RollupError::not_found("machine", id.clone()))?;
            push_machine_steps(line, machine, &mut out);
        }
        Scope::Task(id) => {
            let (line, machine, task) = snapshot
                .task(id)
                .ok_or_else(|| RollupError::not_found("task", id.clone()))?;
            for step in &task.steps {
                out.push(LocatedStep {
                    line,
                    machine,
                    task,
                    step,
                });
            }
        }
    }
    Ok(out)
}

fn push_machine_steps<'a>(
    line: &'a Line,
    machine: &'a Machine,
    out: &mut Vec<LocatedStep<'a>>,
) {
    for task in &machine.tasks {
        for step in &task.steps {
            out.push(LocatedStep {
                line,
                machine,
                task,
                step,
            });
        }
    }
}

fn scope_steps<'a>(snapshot: &'a HierarchySnapshot, scope: &Scope) -> Result<Vec<&'a Step>> {
    Ok(located_steps(snapshot, scope)?
        .into_iter()
        .map(|entry| entry.step)
        .collect())
}

fn controls_of<'a>(steps: &'a [&'a Step]) -> impl Iterator<Item = &'a Control> + 'a {
    steps
        .iter()
        .flat_map(|step| step.assessments.iter())
        .flat_map(|assessment| assessment.controls.iter())
}

fn build_scope_rollup(id: &str, name: &str, steps: Vec<&Step>, now: DateTime<Utc>) -> ScopeRollup {
    let counts = rollup_steps(steps.iter().copied());
    let additional_controls = count_progress(controls_of(&steps), now);

    ScopeRollup {
        id: id.to_string(),
        name: name.to_string(),
        counts: counts.counts,
        dots: counts.dots,
        high_risk_recommended_category_counts: counts.high_risk_recommended_category_counts,
        additional_controls,
    }
}
