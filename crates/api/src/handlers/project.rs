//! Handlers for the `/projects` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. Every
//! single-project operation is guarded by ownership: only the project's
//! owner may view, update, or delete it. Architect and constructor
//! references are informational and grant no access.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use chantier_core::error::CoreError;
use chantier_core::steps::{apply_step_update, Step, UpdateStep};
use chantier_core::types::{DbId, Timestamp};
use chantier_db::models::project::{CreateProject, Project, ProjectListQuery, UpdateProject};
use chantier_db::models::user::UserSummary;
use chantier_db::repositories::{ProjectRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One page of projects plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectListItem>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

/// A listed project with architect/constructor references resolved to
/// display summaries.
#[derive(Debug, Serialize)]
pub struct ProjectListItem {
    #[serde(flatten)]
    pub project: Project,
    pub architect: Option<UserSummary>,
    pub constructor: Option<UserSummary>,
}

/// A single project with all participant references resolved.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub architect: Option<UserSummary>,
    pub constructor: Option<UserSummary>,
}

/// Result of a step update: the new step state and the project's
/// recomputed progress.
#[derive(Debug, Serialize)]
pub struct StepUpdateResult {
    pub step: Step,
    pub progress: ProgressInfo,
}

/// Derived progress of a project.
#[derive(Debug, Serialize)]
pub struct ProgressInfo {
    pub percentage: i32,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a project by ID and verify the caller owns it.
///
/// Returns `NotFound` if the project does not exist, `Forbidden` if the
/// caller is not the owner. `action` is used in the error message
/// (e.g. "view", "update", "delete"). Identity is compared as the
/// canonical `DbId`, never via populated reference objects.
async fn find_and_authorize(
    pool: &sqlx::PgPool,
    project_id: DbId,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    if project.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's project"
        ))));
    }

    Ok(project)
}

/// Resolve an optional participant reference to its display summary.
async fn resolve_participant(
    pool: &sqlx::PgPool,
    user_id: Option<DbId>,
) -> AppResult<Option<UserSummary>> {
    match user_id {
        Some(id) => Ok(UserRepo::find_summary(pool, id).await?),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
///
/// Create a project owned by the authenticated caller. The payload is
/// validated in full before anything is persisted; a validation failure
/// reports every violated field and leaves the store untouched.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let project = ProjectRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        project_id = project.id,
        owner_id = auth.user_id,
        "Project created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// List the caller's projects, newest first. Supports `page`, `limit`,
/// `status` (exact match) and `search` (title/description substring)
/// query parameters. The filter is always scoped to the caller; no
/// other user's projects can appear.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<ProjectPage>>> {
    let projects = ProjectRepo::list_by_owner(&state.pool, auth.user_id, &params).await?;
    let total = ProjectRepo::count_by_owner(&state.pool, auth.user_id, &params).await?;

    let limit = params.limit();
    let total_pages = (total + limit - 1) / limit;

    // Resolve architect/constructor references for the whole page in one
    // batch lookup.
    let mut participant_ids: Vec<DbId> = projects
        .iter()
        .flat_map(|p| [p.architect_id, p.constructor_id])
        .flatten()
        .collect();
    participant_ids.sort_unstable();
    participant_ids.dedup();

    let summaries: HashMap<DbId, UserSummary> =
        UserRepo::summaries_by_ids(&state.pool, &participant_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

    let projects = projects
        .into_iter()
        .map(|project| {
            let architect = project.architect_id.and_then(|id| summaries.get(&id).cloned());
            let constructor = project
                .constructor_id
                .and_then(|id| summaries.get(&id).cloned());
            ProjectListItem {
                project,
                architect,
                constructor,
            }
        })
        .collect();

    Ok(Json(DataResponse {
        data: ProjectPage {
            projects,
            total_pages,
            current_page: params.page(),
            total,
        },
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}
///
/// Fetch a single project with owner/architect/constructor resolved to
/// display summaries. Owner-only.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = find_and_authorize(&state.pool, id, &auth, "view").await?;

    let owner = UserRepo::find_summary(&state.pool, project.owner_id).await?;
    let architect = resolve_participant(&state.pool, project.architect_id).await?;
    let constructor = resolve_participant(&state.pool, project.constructor_id).await?;

    Ok(Json(DataResponse {
        data: ProjectDetail {
            project,
            owner,
            architect,
            constructor,
        },
    }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/v1/projects/{id}
///
/// Partially update a project. Only allow-listed fields are applied
/// (ownership can never be reassigned through this endpoint); supplied
/// fields are re-validated before the write.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    find_and_authorize(&state.pool, id, &auth, "update").await?;
    input.validate()?;

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// Update step
// ---------------------------------------------------------------------------

/// PUT /api/v1/projects/{id}/steps/{step_id}
///
/// Update one embedded step: status, images, materials, and notes are
/// each applied only when supplied. The first transition to
/// `in_progress` stamps the step's start date; the first transition to
/// `completed` stamps its end date; neither is ever overwritten. The
/// whole step list is then persisted, recomputing the project's derived
/// progress.
pub async fn update_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, step_id)): Path<(DbId, i64)>,
    Json(input): Json<UpdateStep>,
) -> AppResult<Json<DataResponse<StepUpdateResult>>> {
    let project = find_and_authorize(&state.pool, id, &auth, "update").await?;

    let mut steps = project.steps.0;
    let position = steps
        .iter()
        .position(|s| s.step_id == step_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Step",
            id: step_id,
        }))?;

    apply_step_update(&mut steps[position], &input, chrono::Utc::now())?;

    let project = ProjectRepo::update_steps(&state.pool, id, &steps)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    tracing::info!(
        project_id = id,
        step_id,
        progress = project.progress_percentage,
        "Step updated",
    );

    let step = steps.swap_remove(position);

    Ok(Json(DataResponse {
        data: StepUpdateResult {
            step,
            progress: ProgressInfo {
                percentage: project.progress_percentage,
                updated_at: project.progress_updated_at,
            },
        },
    }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/projects/{id}
///
/// Delete a project. Owner-only; 404 if the project never existed or is
/// already gone.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_and_authorize(&state.pool, id, &auth, "delete").await?;

    let deleted = ProjectRepo::delete(&state.pool, id).await?;
    if deleted {
        tracing::info!(project_id = id, owner_id = auth.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}
