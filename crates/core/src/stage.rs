//! Asynchronously generated pipeline stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A pipeline stage whose artifacts come from an external generation
/// provider. Each (project, stage) pair owns one persisted status map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    /// One still image per scene.
    Keyframe,
    /// One video clip per frame pair.
    Clip,
}

impl GenerationStage {
    pub const ALL: [GenerationStage; 2] = [GenerationStage::Keyframe, GenerationStage::Clip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyframe => "keyframe",
            Self::Clip => "clip",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyframe" | "keyframes" => Ok(Self::Keyframe),
            "clip" | "clips" | "video" => Ok(Self::Clip),
            other => Err(CoreError::Validation(format!(
                "Invalid generation stage '{other}'. Must be one of: keyframe, clip"
            ))),
        }
    }
}
