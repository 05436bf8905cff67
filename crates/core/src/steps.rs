//! Embedded construction step types and update rules.
//!
//! Steps live inside the project row as a JSONB document; the whole list
//! is rewritten on every mutation. This module owns the step status
//! vocabulary, the once-only start/end date stamping rules, and the
//! derived progress percentage.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Step has not been started.
pub const STEP_STATUS_PENDING: &str = "pending";

/// Step is being worked on.
pub const STEP_STATUS_IN_PROGRESS: &str = "in_progress";

/// Step is finished.
pub const STEP_STATUS_COMPLETED: &str = "completed";

/// All valid step status values.
///
/// Transitions between them are intentionally unrestricted so site
/// managers can correct mistakes (e.g. reopen a completed step).
pub const VALID_STEP_STATUSES: &[&str] = &[
    STEP_STATUS_PENDING,
    STEP_STATUS_IN_PROGRESS,
    STEP_STATUS_COMPLETED,
];

/* --------------------------------------------------------------------------
Types
-------------------------------------------------------------------------- */

/// A photo attached to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepImage {
    pub url: String,
    pub caption: Option<String>,
    pub uploaded_at: Option<Timestamp>,
}

/// A material line item for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMaterial {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
}

/// One unit of work embedded in a project.
///
/// `step_id` is unique within its project (validated at create/update
/// time, not globally enforced). List order is the declared work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: i64,
    pub name: String,
    pub description: String,
    #[serde(default = "default_step_status")]
    pub status: String,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub images: Vec<StepImage>,
    #[serde(default)]
    pub materials: Vec<StepMaterial>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_step_status() -> String {
    STEP_STATUS_PENDING.to_string()
}

/// Partial update for a single step. Only supplied fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStep {
    pub status: Option<String>,
    pub images: Option<Vec<StepImage>>,
    pub materials: Option<Vec<StepMaterial>>,
    pub notes: Option<String>,
}

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Validate that a step status string is one of the accepted values.
pub fn validate_step_status(status: &str) -> Result<(), CoreError> {
    if VALID_STEP_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "invalid step status '{status}'; must be one of: {}",
            VALID_STEP_STATUSES.join(", ")
        )))
    }
}

/// Validate a full step list: status vocabulary, required names and
/// descriptions, and `step_id` uniqueness within the project.
pub fn validate_steps(steps: &[Step]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::new();
    for step in steps {
        if step.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "step {} must have a name",
                step.step_id
            )));
        }
        if step.description.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "step {} must have a description",
                step.step_id
            )));
        }
        validate_step_status(&step.status)?;
        if !seen.insert(step.step_id) {
            return Err(CoreError::Validation(format!(
                "duplicate step_id {} within project",
                step.step_id
            )));
        }
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Progress and update rules
-------------------------------------------------------------------------- */

/// Derived completion percentage: `round(100 * completed / total)`,
/// or 0 for an empty step list.
pub fn progress_percentage(steps: &[Step]) -> i32 {
    if steps.is_empty() {
        return 0;
    }
    let completed = steps
        .iter()
        .filter(|s| s.status == STEP_STATUS_COMPLETED)
        .count();
    ((completed as f64 / steps.len() as f64) * 100.0).round() as i32
}

/// Apply a partial update to a step in place.
///
/// Stamps `start_date` the first time the status moves to `in_progress`
/// and `end_date` the first time it moves to `completed`; an already-set
/// date is never overwritten. Fails with a validation error if the
/// supplied status is not in the vocabulary; the step is untouched on
/// error.
pub fn apply_step_update(
    step: &mut Step,
    input: &UpdateStep,
    now: Timestamp,
) -> Result<(), CoreError> {
    if let Some(status) = &input.status {
        validate_step_status(status)?;
    }

    if let Some(status) = &input.status {
        step.status = status.clone();

        if status == STEP_STATUS_IN_PROGRESS && step.start_date.is_none() {
            step.start_date = Some(now);
        }
        if status == STEP_STATUS_COMPLETED && step.end_date.is_none() {
            step.end_date = Some(now);
        }
    }
    if let Some(images) = &input.images {
        step.images = images.clone();
    }
    if let Some(materials) = &input.materials {
        step.materials = materials.clone();
    }
    if let Some(notes) = &input.notes {
        step.notes = Some(notes.clone());
    }

    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
