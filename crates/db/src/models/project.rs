//! Project entity model and DTOs.
//!
//! The embedded sub-documents (location, budget, timeline, steps, media,
//! scene reference) are stored as JSONB columns so every mutation rewrites
//! the whole project row in one atomic statement.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use chantier_core::error::CoreError;
use chantier_core::project as rules;
use chantier_core::steps::{validate_steps, Step};
use chantier_core::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Embedded sub-documents
-------------------------------------------------------------------------- */

/// GPS coordinates for a project site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Site address of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub department: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Project budget. `actual` and `currency` default at deserialization
/// time (0 and XOF respectively) when omitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub estimated: f64,
    #[serde(default)]
    pub actual: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    rules::DEFAULT_CURRENCY.to_string()
}

/// Planned construction period. `duration_days` is declared by the
/// client, not derived from the dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePeriod {
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub duration_days: i32,
}

/// An uploaded project photo. `is_main` marks the cover image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaImage {
    pub url: String,
    pub caption: Option<String>,
    #[serde(default)]
    pub is_main: bool,
    pub uploaded_at: Option<Timestamp>,
}

/// An uploaded project video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaVideo {
    pub url: String,
    pub caption: Option<String>,
    pub duration: Option<f64>,
    pub uploaded_at: Option<Timestamp>,
}

/// An uploaded project document (permit, plan, invoice, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDocument {
    pub url: String,
    pub name: Option<String>,
    pub doc_type: Option<String>,
    pub uploaded_at: Option<Timestamp>,
}

/// Media attached to a project. Only URLs and metadata are stored; the
/// binary content lives in external file storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub images: Vec<MediaImage>,
    #[serde(default)]
    pub videos: Vec<MediaVideo>,
    #[serde(default)]
    pub documents: Vec<MediaDocument>,
}

/// Reference to an externally hosted 3D scene of the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRef {
    pub url: String,
    pub version: Option<String>,
    pub updated_at: Option<Timestamp>,
}

/* --------------------------------------------------------------------------
Entity
-------------------------------------------------------------------------- */

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub owner_id: DbId,
    pub architect_id: Option<DbId>,
    pub constructor_id: Option<DbId>,
    pub location: Json<Location>,
    pub property_type: String,
    pub construction_type: String,
    pub budget: Json<Budget>,
    pub timeline: Json<TimelinePeriod>,
    pub status: String,
    pub steps: Json<Vec<Step>>,
    pub media: Json<Media>,
    pub scene_ref: Option<Json<SceneRef>>,
    /// Derived: `round(100 * completed steps / total steps)`, 0 with no
    /// steps. Recomputed whenever the step list is persisted.
    pub progress_percentage: i32,
    pub progress_updated_at: Timestamp,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/* --------------------------------------------------------------------------
DTOs
-------------------------------------------------------------------------- */

/// DTO for creating a new project.
///
/// The owner is never part of the payload; it is always the
/// authenticated caller, set by the handler.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub architect_id: Option<DbId>,
    pub constructor_id: Option<DbId>,
    pub location: Location,
    pub property_type: String,
    pub construction_type: String,
    pub budget: Budget,
    pub timeline: TimelinePeriod,
    /// Defaults to `planning` if omitted.
    pub status: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    pub media: Option<Media>,
    pub scene_ref: Option<SceneRef>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// DTO for updating an existing project. All fields are optional.
///
/// This is the explicit allow-list of updatable fields: the owner is
/// deliberately absent so a payload can never reassign ownership.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub architect_id: Option<DbId>,
    pub constructor_id: Option<DbId>,
    pub location: Option<Location>,
    pub property_type: Option<String>,
    pub construction_type: Option<String>,
    pub budget: Option<Budget>,
    pub timeline: Option<TimelinePeriod>,
    pub status: Option<String>,
    pub steps: Option<Vec<Step>>,
    pub media: Option<Media>,
    pub scene_ref: Option<SceneRef>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Query parameters for `GET /projects` (`?page=&limit=&status=&search=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Exact-match status filter.
    pub status: Option<String>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
}

/// Default page size when `limit` is omitted.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

impl ProjectListQuery {
    /// Effective 1-based page number.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Collect the message of a failed field check.
fn collect(errors: &mut Vec<String>, result: Result<(), CoreError>) {
    if let Err(CoreError::Validation(msg)) = result {
        errors.push(msg);
    }
}

/// Turn accumulated field violations into a single validation error.
fn into_validation_result(errors: Vec<String>) -> Result<(), CoreError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(errors.join("; ")))
    }
}

impl CreateProject {
    /// Validate every constrained field, reporting all violations at once.
    ///
    /// Must be called before the insert is attempted; nothing is
    /// persisted when this fails.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = Vec::new();

        collect(&mut errors, rules::validate_title(&self.title));
        collect(&mut errors, rules::validate_description(&self.description));
        collect(&mut errors, rules::validate_property_type(&self.property_type));
        collect(
            &mut errors,
            rules::validate_construction_type(&self.construction_type),
        );
        if let Some(status) = &self.status {
            collect(&mut errors, rules::validate_project_status(status));
        }
        collect(&mut errors, validate_steps(&self.steps));

        into_validation_result(errors)
    }
}

impl UpdateProject {
    /// Validate the supplied fields only, reporting all violations at once.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = Vec::new();

        if let Some(title) = &self.title {
            collect(&mut errors, rules::validate_title(title));
        }
        if let Some(description) = &self.description {
            collect(&mut errors, rules::validate_description(description));
        }
        if let Some(property_type) = &self.property_type {
            collect(&mut errors, rules::validate_property_type(property_type));
        }
        if let Some(construction_type) = &self.construction_type {
            collect(
                &mut errors,
                rules::validate_construction_type(construction_type),
            );
        }
        if let Some(status) = &self.status {
            collect(&mut errors, rules::validate_project_status(status));
        }
        if let Some(steps) = &self.steps {
            collect(&mut errors, validate_steps(steps));
        }

        into_validation_result(errors)
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
