//! Category attribution - which recommendation categories a step carries
//!
//! Explains *why* a step is high risk: the categories of its ADDITIONAL
//! controls. Rollups only count these for steps at HIGH or above; the
//! threshold itself is applied by the aggregator, not here.

use crate::hierarchy::Step;
use std::collections::BTreeSet;

/// The distinct category ids recommended on one step
///
/// ADDITIONAL controls without a category are skipped. The set is ordered
/// for deterministic output.
pub fn step_categories(step: &Step) -> BTreeSet<String> {
    step.assessments
        .iter()
        .flat_map(|a| a.additional_controls())
        .filter_map(|c| c.category_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Assessment, Control, ControlPhase, ControlStatus};

    fn control(phase: ControlPhase, category_id: Option<&str>) -> Control {
        Control {
            id: "c".to_string(),
            description: "control".to_string(),
            phase,
            control_type: None,
            category_id: category_id.map(str::to_string),
            due_date: None,
            status: ControlStatus::Proposed,
            verified_at: None,
        }
    }

    fn step_with_controls(controls: Vec<Control>) -> Step {
        Step {
            id: "s-1".to_string(),
            step_no: 1,
            title: "step".to_string(),
            assessments: vec![Assessment {
                id: "a-1".to_string(),
                hazard: "hazard".to_string(),
                existing: None,
                predicted: None,
                controls,
            }],
        }
    }

    #[test]
    fn test_only_categorized_additional_controls_count() {
        let step = step_with_controls(vec![
            control(ControlPhase::Additional, Some("guarding")),
            control(ControlPhase::Additional, Some("training")),
            control(ControlPhase::Additional, None),
            control(ControlPhase::Existing, Some("procedures")),
        ]);

        let categories = step_categories(&step);
        assert_eq!(
            categories.into_iter().collect::<Vec<_>>(),
            vec!["guarding".to_string(), "training".to_string()]
        );
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let step = step_with_controls(vec![
            control(ControlPhase::Additional, Some("guarding")),
            control(ControlPhase::Additional, Some("guarding")),
        ]);
        assert_eq!(step_categories(&step).len(), 1);
    }
}
