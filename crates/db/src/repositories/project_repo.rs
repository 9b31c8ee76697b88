//! Read access to `projects`, `scenes` and `frame_pairs`.
//!
//! Rows in these tables are written by the script and keyframe stages;
//! generation only reads them.

use reelforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{FramePairRow, Project, SceneRow};

/// Provides read queries for projects and their generation inputs.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Find a project by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List a project's scenes in script order.
    pub async fn list_scenes(pool: &PgPool, project_id: DbId) -> Result<Vec<SceneRow>, sqlx::Error> {
        sqlx::query_as::<_, SceneRow>(
            "SELECT id, project_id, position, description, camera, duration_secs \
             FROM scenes WHERE project_id = $1 ORDER BY position ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// List a project's frame pairs in clip order.
    pub async fn list_frame_pairs(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<FramePairRow>, sqlx::Error> {
        sqlx::query_as::<_, FramePairRow>(
            "SELECT id, project_id, position, first_frame_url, last_frame_url \
             FROM frame_pairs WHERE project_id = $1 ORDER BY position ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
