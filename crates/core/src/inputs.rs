//! Generation inputs produced by earlier pipeline stages.
//!
//! These are read-only here: the script stage writes scenes, the keyframe
//! stage's artifacts are paired into frame pairs by the editor. The core
//! only reads them to build work units.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stage::GenerationStage;
use crate::types::DbId;

/// One scene of the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Zero-based order within the project.
    pub position: i32,
    pub description: String,
    /// Camera direction derived from the script, e.g. `"slow dolly in"`.
    pub camera: Option<String>,
    /// Narration length covered by this scene.
    pub duration_secs: Option<f64>,
}

/// Start and end keyframes bounding one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePair {
    /// Zero-based order; matches the scene at the same position.
    pub position: i32,
    pub first_frame_url: String,
    pub last_frame_url: String,
}

/// Everything the store knows about a project that generation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInputs {
    pub project_id: DbId,
    pub scenes: Vec<Scene>,
    pub frame_pairs: Vec<FramePair>,
}

impl ProjectInputs {
    pub fn scene_at(&self, position: i32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.position == position)
    }

    /// Fail fast when the prior stage has produced nothing to generate from.
    pub fn require_stage_inputs(&self, stage: GenerationStage) -> Result<(), CoreError> {
        match stage {
            GenerationStage::Keyframe if self.scenes.is_empty() => Err(CoreError::Validation(
                format!(
                    "Project {} has no scenes; generate the script before keyframes",
                    self.project_id
                ),
            )),
            GenerationStage::Clip if self.frame_pairs.is_empty() => Err(CoreError::Validation(
                format!(
                    "Project {} has no frame pairs; generate keyframes before clips",
                    self.project_id
                ),
            )),
            _ => Ok(()),
        }
    }
}
