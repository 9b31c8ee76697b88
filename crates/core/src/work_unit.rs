//! Work units: one provider submission each.
//!
//! Built from [`ProjectInputs`] for a given [`GenerationStage`]. Output
//! shape constraints (duration, resolution, aspect ratio) are resolved here
//! so the provider layer only has to map fields onto its request body.

use serde::Serialize;

use crate::error::CoreError;
use crate::inputs::{FramePair, ProjectInputs, Scene};
use crate::stage::GenerationStage;

// ---------------------------------------------------------------------------
// Output shape defaults
// ---------------------------------------------------------------------------

/// Clip lengths the video model accepts, in seconds.
pub const SUPPORTED_CLIP_DURATIONS_SECS: &[u32] = &[5, 10];
/// Used when a scene carries no duration.
pub const DEFAULT_CLIP_DURATION_SECS: u32 = 5;
pub const DEFAULT_CLIP_RESOLUTION: &str = "720p";
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_IMAGE_FORMAT: &str = "png";

/// One unit of generation work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkUnit {
    /// Stable reference to the input the unit was built from,
    /// e.g. `scene-3` or `frame-pair-3`.
    pub unit_ref: String,
    pub stage: GenerationStage,
    pub prompt: Option<String>,
    /// Source images, in order. Empty for keyframes, `[first, last]` for clips.
    pub source_image_urls: Vec<String>,
    pub shape: OutputShape,
}

/// Output constraints for one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputShape {
    pub aspect_ratio: String,
    /// Clip resolution, e.g. `720p`. `None` for images.
    pub resolution: Option<String>,
    /// Clip duration. `None` for images.
    pub duration_secs: Option<u32>,
    /// Image file format. `None` for clips.
    pub format: Option<String>,
}

/// Build every work unit for a stage, in input order.
pub fn build_work_units(
    inputs: &ProjectInputs,
    stage: GenerationStage,
) -> Result<Vec<WorkUnit>, CoreError> {
    inputs.require_stage_inputs(stage)?;

    let units = match stage {
        GenerationStage::Keyframe => {
            let mut scenes: Vec<&Scene> = inputs.scenes.iter().collect();
            scenes.sort_by_key(|s| s.position);
            scenes.into_iter().map(keyframe_unit).collect()
        }
        GenerationStage::Clip => {
            let mut pairs: Vec<&FramePair> = inputs.frame_pairs.iter().collect();
            pairs.sort_by_key(|p| p.position);
            pairs
                .into_iter()
                .map(|pair| clip_unit(pair, inputs.scene_at(pair.position)))
                .collect()
        }
    };
    Ok(units)
}

fn keyframe_unit(scene: &Scene) -> WorkUnit {
    WorkUnit {
        unit_ref: format!("scene-{}", scene.position),
        stage: GenerationStage::Keyframe,
        prompt: Some(scene_prompt(scene)),
        source_image_urls: Vec::new(),
        shape: OutputShape {
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            resolution: None,
            duration_secs: None,
            format: Some(DEFAULT_IMAGE_FORMAT.to_string()),
        },
    }
}

fn clip_unit(pair: &FramePair, scene: Option<&Scene>) -> WorkUnit {
    WorkUnit {
        unit_ref: format!("frame-pair-{}", pair.position),
        stage: GenerationStage::Clip,
        prompt: scene.map(scene_prompt),
        source_image_urls: vec![pair.first_frame_url.clone(), pair.last_frame_url.clone()],
        shape: OutputShape {
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            resolution: Some(DEFAULT_CLIP_RESOLUTION.to_string()),
            duration_secs: Some(clip_duration_secs(scene.and_then(|s| s.duration_secs))),
            format: None,
        },
    }
}

/// Scene description with its camera direction appended.
fn scene_prompt(scene: &Scene) -> String {
    match scene.camera.as_deref().map(str::trim) {
        Some(camera) if !camera.is_empty() => {
            format!("{}. Camera: {camera}", scene.description.trim_end_matches('.'))
        }
        _ => scene.description.clone(),
    }
}

/// Snap a scene duration to the nearest supported clip length.
///
/// Ties go to the shorter clip. Missing or non-positive durations use
/// [`DEFAULT_CLIP_DURATION_SECS`].
pub fn clip_duration_secs(scene_duration: Option<f64>) -> u32 {
    match scene_duration {
        Some(d) if d > 0.0 => SUPPORTED_CLIP_DURATIONS_SECS
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (*a as f64 - d).abs();
                let db = (*b as f64 - d).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(DEFAULT_CLIP_DURATION_SECS),
        _ => DEFAULT_CLIP_DURATION_SECS,
    }
}
