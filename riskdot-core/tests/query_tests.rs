//! Query surface tests
//!
//! Exercises the task/step queries, filters, category attribution
//! thresholds, control progress, and the recommendations grouping against
//! one realistic plant snapshot.

use chrono::{DateTime, TimeZone, Utc};
use riskdot_core::hierarchy::{
    Assessment, Control, ControlPhase, ControlStatus, ControlType, HierarchySnapshot, Line,
    Machine, ScoredRisk, Step, Task,
};
use riskdot_core::matrix::RiskMatrix;
use riskdot_core::query::{
    recommendations, scope_progress, steps_for_task, tasks_for_machine, Scope, StepFilters,
    TaskFilters,
};
use riskdot_core::{Dot, RiskBand, RollupError};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn scored(severity: u8, probability: u8) -> ScoredRisk {
    let resolved = RiskMatrix::seeded_default()
        .resolve(severity, probability)
        .unwrap();
    ScoredRisk {
        severity,
        probability,
        rating: resolved.rating,
        band: resolved.band,
    }
}

fn control(
    id: &str,
    category_id: Option<&str>,
    control_type: Option<ControlType>,
    status: ControlStatus,
    due_date: Option<DateTime<Utc>>,
) -> Control {
    Control {
        id: id.to_string(),
        description: format!("Action {}", id),
        phase: ControlPhase::Additional,
        control_type,
        category_id: category_id.map(str::to_string),
        due_date,
        status,
        verified_at: None,
    }
}

/// One line, one machine, two tasks:
/// - t-change (category "cleaning", phase "shutdown"):
///   - step 1: VERY_HIGH mitigated to VERY_LOW, guarding + training actions
///   - step 2: unassessed
///   - step 3: MEDIUM with a guarding action (below the high-risk threshold)
/// - t-run (category "production", phase "running"):
///   - step 1: HIGH, no scored mitigation, one uncategorized overdue action
fn plant_snapshot() -> HierarchySnapshot {
    let overdue = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    HierarchySnapshot::new(vec![Line {
        id: "l-1".to_string(),
        name: "Packing Line".to_string(),
        machines: vec![Machine {
            id: "m-1".to_string(),
            name: "Case Packer".to_string(),
            tasks: vec![
                Task {
                    id: "t-change".to_string(),
                    name: "Changeover".to_string(),
                    category_id: Some("cleaning".to_string()),
                    phase_id: Some("shutdown".to_string()),
                    steps: vec![
                        Step {
                            id: "s-1".to_string(),
                            step_no: 1,
                            title: "Remove guard".to_string(),
                            assessments: vec![Assessment {
                                id: "a-1".to_string(),
                                hazard: "Crush point".to_string(),
                                existing: Some(scored(8, 8)),
                                predicted: Some(scored(2, 2)),
                                controls: vec![
                                    control(
                                        "c-guard",
                                        Some("guarding"),
                                        Some(ControlType::Engineering),
                                        ControlStatus::Proposed,
                                        None,
                                    ),
                                    control(
                                        "c-train",
                                        Some("training"),
                                        Some(ControlType::Training),
                                        ControlStatus::Implemented,
                                        None,
                                    ),
                                ],
                            }],
                        },
                        Step {
                            id: "s-2".to_string(),
                            step_no: 2,
                            title: "Wipe rails".to_string(),
                            assessments: Vec::new(),
                        },
                        Step {
                            id: "s-3".to_string(),
                            step_no: 3,
                            title: "Refit guard".to_string(),
                            assessments: vec![Assessment {
                                id: "a-3".to_string(),
                                hazard: "Sharp edge".to_string(),
                                existing: Some(scored(4, 4)),
                                predicted: None,
                                controls: vec![control(
                                    "c-edge",
                                    Some("guarding"),
                                    None,
                                    ControlStatus::Proposed,
                                    None,
                                )],
                            }],
                        },
                    ],
                },
                Task {
                    id: "t-run".to_string(),
                    name: "Normal operation".to_string(),
                    category_id: Some("production".to_string()),
                    phase_id: Some("running".to_string()),
                    steps: vec![Step {
                        id: "s-4".to_string(),
                        step_no: 1,
                        title: "Clear jam".to_string(),
                        assessments: vec![Assessment {
                            id: "a-4".to_string(),
                            hazard: "Entanglement".to_string(),
                            existing: Some(scored(6, 6)),
                            predicted: None,
                            controls: vec![control(
                                "c-jam",
                                None,
                                None,
                                ControlStatus::InProgress,
                                Some(overdue),
                            )],
                        }],
                    }],
                },
            ],
        }],
    }])
}

#[test]
fn test_tasks_for_machine_filters_by_attributes() {
    let snapshot = plant_snapshot();

    let all = tasks_for_machine(&snapshot, "m-1", &TaskFilters::default(), now()).unwrap();
    assert_eq!(all.len(), 2);

    let filters = TaskFilters {
        task_category_id: Some("cleaning".to_string()),
        task_phase_id: None,
    };
    let cleaning = tasks_for_machine(&snapshot, "m-1", &filters, now()).unwrap();
    assert_eq!(cleaning.len(), 1);
    assert_eq!(cleaning[0].id, "t-change");

    let mismatched = TaskFilters {
        task_category_id: Some("cleaning".to_string()),
        task_phase_id: Some("running".to_string()),
    };
    assert!(tasks_for_machine(&snapshot, "m-1", &mismatched, now())
        .unwrap()
        .is_empty());
}

#[test]
fn test_category_attribution_threshold_in_task_rollup() {
    let snapshot = plant_snapshot();
    let tasks = tasks_for_machine(&snapshot, "m-1", &TaskFilters::default(), now()).unwrap();
    let changeover = tasks.iter().find(|t| t.id == "t-change").unwrap();

    // s-1 is VERY_HIGH: its guarding and training actions count. s-3 is
    // MEDIUM: its guarding action contributes nothing.
    assert_eq!(
        changeover.high_risk_recommended_category_counts["guarding"],
        1
    );
    assert_eq!(
        changeover.high_risk_recommended_category_counts["training"],
        1
    );
}

#[test]
fn test_steps_for_task_rows_and_bands() {
    let snapshot = plant_snapshot();
    let steps = steps_for_task(&snapshot, "t-change", &StepFilters::default()).unwrap();
    assert_eq!(steps.len(), 3);

    let first = &steps[0];
    assert_eq!(first.step_no, 1);
    assert_eq!(first.current_band, Some(RiskBand::VeryHigh));
    assert_eq!(first.predicted_band, Some(RiskBand::VeryLow));
    assert_eq!(first.dot, Dot::Orange);
    assert!(first.has_high_risk_training_recommendation);
    assert_eq!(
        first.recommended_action_category_ids,
        vec!["guarding".to_string(), "training".to_string()]
    );

    let second = &steps[1];
    assert_eq!(second.current_band, None);
    assert_eq!(second.dot, Dot::Gray);
}

#[test]
fn test_steps_for_task_dot_and_category_filters() {
    let snapshot = plant_snapshot();

    let orange_only = steps_for_task(
        &snapshot,
        "t-change",
        &StepFilters {
            dot: Some(Dot::Orange),
            category_id: None,
        },
    )
    .unwrap();
    assert_eq!(orange_only.len(), 1);
    assert_eq!(orange_only[0].id, "s-1");

    let guarding = steps_for_task(
        &snapshot,
        "t-change",
        &StepFilters {
            dot: None,
            category_id: Some("guarding".to_string()),
        },
    )
    .unwrap();
    assert_eq!(guarding.len(), 2);

    // Both filters must match.
    let both = steps_for_task(
        &snapshot,
        "t-change",
        &StepFilters {
            dot: Some(Dot::Yellow),
            category_id: Some("guarding".to_string()),
        },
    )
    .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].id, "s-3");
}

#[test]
fn test_scope_progress_counts() {
    let snapshot = plant_snapshot();

    // Line scope: 4 additional controls, 1 implemented, 1 overdue.
    let progress = scope_progress(&snapshot, &Scope::Line("l-1".to_string()), now()).unwrap();
    assert_eq!(progress.total, 4);
    assert_eq!(progress.implemented, 1);
    assert_eq!(progress.open, 3);
    assert_eq!(progress.overdue, 1);

    // Task scope narrows to that task's controls only.
    let task_progress =
        scope_progress(&snapshot, &Scope::Task("t-run".to_string()), now()).unwrap();
    assert_eq!(task_progress.total, 1);
    assert_eq!(task_progress.overdue, 1);
}

#[test]
fn test_recommendations_group_open_controls_with_location() {
    let snapshot = plant_snapshot();
    let report =
        recommendations(&snapshot, &Scope::Machine("m-1".to_string()), now()).unwrap();

    // c-train is implemented and excluded; c-guard, c-edge, c-jam are open.
    assert_eq!(report.total_open, 3);

    let uncategorized = report
        .categories
        .iter()
        .find(|g| g.category_id.is_none())
        .unwrap();
    assert_eq!(uncategorized.total, 1);
    let jam = &uncategorized.controls[0];
    assert!(jam.overdue);
    assert_eq!(jam.location.line, "Packing Line");
    assert_eq!(jam.location.machine, "Case Packer");
    assert_eq!(jam.location.task, "Normal operation");
    assert_eq!(jam.location.step_no, 1);

    let guarding = report
        .categories
        .iter()
        .find(|g| g.category_id.as_deref() == Some("guarding"))
        .unwrap();
    assert_eq!(guarding.total, 2);
}

#[test]
fn test_missing_scopes_return_not_found() {
    let snapshot = plant_snapshot();

    assert_eq!(
        tasks_for_machine(&snapshot, "m-404", &TaskFilters::default(), now()).unwrap_err(),
        RollupError::not_found("machine", "m-404")
    );
    assert_eq!(
        steps_for_task(&snapshot, "t-404", &StepFilters::default()).unwrap_err(),
        RollupError::not_found("task", "t-404")
    );
    assert_eq!(
        scope_progress(&snapshot, &Scope::Line("l-404".to_string()), now()).unwrap_err(),
        RollupError::not_found("line", "l-404")
    );
    assert_eq!(
        recommendations(&snapshot, &Scope::Task("t-404".to_string()), now()).unwrap_err(),
        RollupError::not_found("task", "t-404")
    );
}

#[test]
fn test_snapshot_json_round_trip_preserves_queries() {
    let snapshot = plant_snapshot();
    let json = snapshot.to_json().unwrap();
    let restored = HierarchySnapshot::from_json(&json).unwrap();

    let before = steps_for_task(&snapshot, "t-change", &StepFilters::default()).unwrap();
    let after = steps_for_task(&restored, "t-change", &StepFilters::default()).unwrap();
    assert_eq!(before, after);
}
