//! Repository for the `projects` table.
//!
//! Every query is scoped or keyed by primary id; ownership checks belong
//! to the handler layer. Mutations rewrite the affected JSONB documents
//! whole, so a single UPDATE is the unit of atomicity (last-write-wins
//! for concurrent writers, acceptable for the single-owner model).

use sqlx::types::Json;
use sqlx::PgPool;

use chantier_core::steps::{progress_percentage, Step};
use chantier_core::types::DbId;

use crate::models::project::{CreateProject, Project, ProjectListQuery, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, owner_id, architect_id, constructor_id, \
     location, property_type, construction_type, budget, timeline, status, \
     steps, media, scene_ref, progress_percentage, progress_updated_at, \
     is_public, tags, created_at, updated_at";

/// Empty media document used when the client supplies none.
const EMPTY_MEDIA: &str = r#"{"images": [], "videos": [], "documents": []}"#;

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_id`, returning the created row.
    ///
    /// The initial progress percentage is derived from the supplied step
    /// list. Status defaults to `planning`, media to empty lists, and
    /// visibility to private. The caller is responsible for running
    /// [`CreateProject::validate`] first.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let progress = progress_percentage(&input.steps);
        let query = format!(
            "INSERT INTO projects
                (title, description, owner_id, architect_id, constructor_id,
                 location, property_type, construction_type, budget, timeline,
                 status, steps, media, scene_ref, progress_percentage,
                 is_public, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     COALESCE($11, 'planning'), $12,
                     COALESCE($13, '{EMPTY_MEDIA}'::jsonb), $14, $15,
                     COALESCE($16, FALSE), COALESCE($17, ARRAY[]::TEXT[]))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.title.trim())
            .bind(input.description.trim())
            .bind(owner_id)
            .bind(input.architect_id)
            .bind(input.constructor_id)
            .bind(Json(&input.location))
            .bind(&input.property_type)
            .bind(&input.construction_type)
            .bind(Json(&input.budget))
            .bind(Json(&input.timeline))
            .bind(&input.status)
            .bind(Json(&input.steps))
            .bind(input.media.as_ref().map(Json))
            .bind(input.scene_ref.as_ref().map(Json))
            .bind(progress)
            .bind(input.is_public)
            .bind(input.tags.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of the caller's projects, most recently created first.
    ///
    /// Optional `status` filter is exact-match; optional `search` matches
    /// title or description case-insensitively. Page and limit come
    /// pre-clamped from [`ProjectListQuery`].
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        params: &ProjectListQuery,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let limit = params.limit();
        let offset = (params.page() - 1) * limit;

        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE owner_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL
                    OR title ILIKE '%' || $3 || '%'
                    OR description ILIKE '%' || $3 || '%')
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .bind(&params.status)
            .bind(&params.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count the caller's projects matching the same filter as
    /// [`Self::list_by_owner`], independent of pagination.
    pub async fn count_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        params: &ProjectListQuery,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects
             WHERE owner_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL
                    OR title ILIKE '%' || $3 || '%'
                    OR description ILIKE '%' || $3 || '%')",
        )
        .bind(owner_id)
        .bind(&params.status)
        .bind(&params.search)
        .fetch_one(pool)
        .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied;
    /// the owner column is not part of the allow-list and never changes.
    ///
    /// When the step list is replaced, the derived progress percentage is
    /// recomputed and written in the same statement. Returns `None` if no
    /// row with the given `id` exists. The caller is responsible for
    /// running [`UpdateProject::validate`] first.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let progress = input.steps.as_deref().map(progress_percentage);
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                architect_id = COALESCE($4, architect_id),
                constructor_id = COALESCE($5, constructor_id),
                location = COALESCE($6, location),
                property_type = COALESCE($7, property_type),
                construction_type = COALESCE($8, construction_type),
                budget = COALESCE($9, budget),
                timeline = COALESCE($10, timeline),
                status = COALESCE($11, status),
                steps = COALESCE($12, steps),
                progress_percentage = COALESCE($13, progress_percentage),
                progress_updated_at = CASE WHEN $12 IS NULL
                    THEN progress_updated_at ELSE NOW() END,
                media = COALESCE($14, media),
                scene_ref = COALESCE($15, scene_ref),
                is_public = COALESCE($16, is_public),
                tags = COALESCE($17, tags)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.architect_id)
            .bind(input.constructor_id)
            .bind(input.location.as_ref().map(Json))
            .bind(&input.property_type)
            .bind(&input.construction_type)
            .bind(input.budget.as_ref().map(Json))
            .bind(input.timeline.as_ref().map(Json))
            .bind(&input.status)
            .bind(input.steps.as_ref().map(Json))
            .bind(progress)
            .bind(input.media.as_ref().map(Json))
            .bind(input.scene_ref.as_ref().map(Json))
            .bind(input.is_public)
            .bind(input.tags.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Replace a project's step list, recomputing the derived progress in
    /// the same atomic statement. Returns `None` if the project is gone.
    pub async fn update_steps(
        pool: &PgPool,
        id: DbId,
        steps: &[Step],
    ) -> Result<Option<Project>, sqlx::Error> {
        let progress = progress_percentage(steps);
        let query = format!(
            "UPDATE projects SET
                steps = $2,
                progress_percentage = $3,
                progress_updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(Json(steps))
            .bind(progress)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project by ID. Returns `true` if a row was
    /// removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
