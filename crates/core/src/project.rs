//! Project-level constants and field validation.
//!
//! Defines the valid project statuses, property and construction types,
//! field length limits, and the validation helpers used by the DB and API
//! layers before any create or update is persisted.

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length for a project title.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length for a project description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Project has been created but work has not started.
pub const PROJECT_STATUS_PLANNING: &str = "planning";

/// Work is underway.
pub const PROJECT_STATUS_IN_PROGRESS: &str = "in_progress";

/// Work is paused.
pub const PROJECT_STATUS_ON_HOLD: &str = "on_hold";

/// All work is finished.
pub const PROJECT_STATUS_COMPLETED: &str = "completed";

/// Project was abandoned.
pub const PROJECT_STATUS_CANCELLED: &str = "cancelled";

/// All valid project status values.
pub const VALID_PROJECT_STATUSES: &[&str] = &[
    PROJECT_STATUS_PLANNING,
    PROJECT_STATUS_IN_PROGRESS,
    PROJECT_STATUS_ON_HOLD,
    PROJECT_STATUS_COMPLETED,
    PROJECT_STATUS_CANCELLED,
];

/// All valid property type values.
pub const VALID_PROPERTY_TYPES: &[&str] =
    &["maison", "appartement", "villa", "bureau", "commerce"];

/// All valid construction type values.
pub const VALID_CONSTRUCTION_TYPES: &[&str] = &["neuf", "renovation", "extension"];

/// Default budget currency (CFA franc).
pub const DEFAULT_CURRENCY: &str = "XOF";

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate a project title: non-empty after trimming, at most
/// [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("title must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a project description: non-empty after trimming, at most
/// [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "description must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "description must not exceed {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate that a project status string is one of the accepted values.
pub fn validate_project_status(status: &str) -> Result<(), CoreError> {
    if VALID_PROJECT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "invalid project status '{status}'; must be one of: {}",
            VALID_PROJECT_STATUSES.join(", ")
        )))
    }
}

/// Validate that a property type string is one of the accepted values.
pub fn validate_property_type(property_type: &str) -> Result<(), CoreError> {
    if VALID_PROPERTY_TYPES.contains(&property_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "invalid property type '{property_type}'; must be one of: {}",
            VALID_PROPERTY_TYPES.join(", ")
        )))
    }
}

/// Validate that a construction type string is one of the accepted values.
pub fn validate_construction_type(construction_type: &str) -> Result<(), CoreError> {
    if VALID_CONSTRUCTION_TYPES.contains(&construction_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "invalid construction type '{construction_type}'; must be one of: {}",
            VALID_CONSTRUCTION_TYPES.join(", ")
        )))
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
