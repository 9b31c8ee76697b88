//! Project, scene and frame pair rows.

use reelforge_core::inputs::{FramePair, Scene};
use reelforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneRow {
    pub id: DbId,
    pub project_id: DbId,
    pub position: i32,
    pub description: String,
    pub camera: Option<String>,
    pub duration_secs: Option<f64>,
}

impl From<SceneRow> for Scene {
    fn from(row: SceneRow) -> Self {
        Scene {
            position: row.position,
            description: row.description,
            camera: row.camera,
            duration_secs: row.duration_secs,
        }
    }
}

/// A row from the `frame_pairs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FramePairRow {
    pub id: DbId,
    pub project_id: DbId,
    pub position: i32,
    pub first_frame_url: String,
    pub last_frame_url: String,
}

impl From<FramePairRow> for FramePair {
    fn from(row: FramePairRow) -> Self {
        FramePair {
            position: row.position,
            first_frame_url: row.first_frame_url,
            last_frame_url: row.last_frame_url,
        }
    }
}
