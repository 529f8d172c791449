//! Rollup rendering
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output for identical input

use crate::controls::ControlsProgress;
use crate::query::{RecommendationsReport, ScopeRollup, StepRollup};
use serde::Serialize;

/// Render any rollup output as pretty JSON
pub fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Render scope rollups (lines/machines/tasks) as an aligned text table
pub fn render_scopes_text(rollups: &[ScopeRollup]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<28} {:>5} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}  DOTS g/G/y/o/r       CONTROLS done/open/late\n",
        "NAME", "TOTAL", "UNASSD", "VLOW", "LOW", "MED", "MED+", "HIGH", "VHIGH"
    ));

    for rollup in rollups {
        let c = &rollup.counts;
        let d = &rollup.dots;
        let p = &rollup.additional_controls;
        output.push_str(&format!(
            "{:<28} {:>5} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}  {:>4}/{}/{}/{}/{:<8} {}/{}/{}\n",
            truncate_or_pad(&rollup.name, 28),
            c.total,
            c.unassessed,
            c.very_low,
            c.low,
            c.medium,
            c.medium_plus,
            c.high,
            c.very_high,
            d.gray,
            d.green,
            d.yellow,
            d.orange,
            d.red,
            p.implemented,
            p.open,
            p.overdue,
        ));
    }

    output
}

/// Render a step listing as text
pub fn render_steps_text(steps: &[StepRollup]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<4} {:<32} {:<12} {:<12} {:<8} {}\n",
        "NO", "STEP", "CURRENT", "PREDICTED", "DOT", "CATEGORIES"
    ));

    for step in steps {
        let current = step.current_band.map(|b| b.as_str()).unwrap_or("-");
        let predicted = step.predicted_band.map(|b| b.as_str()).unwrap_or("-");
        let categories = if step.recommended_action_category_ids.is_empty() {
            "-".to_string()
        } else {
            step.recommended_action_category_ids.join(", ")
        };
        output.push_str(&format!(
            "{:<4} {:<32} {:<12} {:<12} {:<8} {}\n",
            step.step_no,
            truncate_or_pad(&step.title, 32),
            current,
            predicted,
            step.dot.as_str(),
            categories,
        ));
    }

    output
}

/// Render a progress object as text
pub fn render_progress_text(progress: &ControlsProgress) -> String {
    format!(
        "total {}  implemented {}  open {}  overdue {}\n",
        progress.total, progress.implemented, progress.open, progress.overdue
    )
}

/// Render grouped recommendations as text
pub fn render_recommendations_text(report: &RecommendationsReport) -> String {
    let mut output = format!("{} open recommended action(s)\n", report.total_open);

    for group in &report.categories {
        let label = group.category_id.as_deref().unwrap_or("(uncategorized)");
        output.push_str(&format!("\n{} ({})\n", label, group.total));
        for control in &group.controls {
            let due = control
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            let late = if control.overdue { " OVERDUE" } else { "" };
            output.push_str(&format!(
                "  {} [due {}{}] {} > {} > {} > step {}\n",
                control.description,
                due,
                late,
                control.location.line,
                control.location.machine,
                control.location.task,
                control.location.step_no,
            ));
        }
    }

    output
}

/// Truncate or pad string to fixed width, cutting on char boundaries
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let cut = s
            .char_indices()
            .nth(width.saturating_sub(3))
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}...", &s[..cut])
    } else {
        format!("{:<width$}", s, width = width)
    }
}
