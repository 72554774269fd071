//! Dashboard Overlay
//!
//! Cosmetic rendering of the per-frame result. Nothing here feeds back into
//! counting or timing; frames are written to disk instead of a window.

mod render;
mod writer;

pub use render::{OverlayRenderer, Palette};
pub use writer::OverlayWriter;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overlay errors
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Frame conversion failed: {0}")]
    Frame(String),

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Invalid overlay configuration: {0}")]
    Config(String),
}

/// Overlay output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,

    /// Directory receiving annotated PNG frames
    pub output_dir: PathBuf,

    /// Write one annotated frame every N processed frames
    pub every_n_frames: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: PathBuf::from("overlay"),
            every_n_frames: 30,
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.every_n_frames == 0 {
            return Err(OverlayError::Config("every_n_frames must be at least 1".to_string()));
        }
        Ok(())
    }
}
