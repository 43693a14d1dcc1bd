use crate::error::CameraError;
use crate::frame::FrameData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical camera a stream is bound to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera, facing away from the user
    Environment,
}

impl FacingMode {
    pub fn opposite(&self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Playback state of the video element fed by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoState {
    pub paused: bool,
    pub ended: bool,
    pub width: u32,
    pub height: u32,
}

impl VideoState {
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether a frame can be drawn right now
    pub fn is_ready(&self) -> bool {
        !self.paused && !self.ended && self.has_dimensions()
    }
}

/// A live camera stream, exclusively owned by one capture session.
pub trait MediaStream: Send {
    fn facing_mode(&self) -> FacingMode;

    /// Current playback state. Implementations may pull pending frames to
    /// learn the native dimensions.
    fn video_state(&mut self) -> VideoState;

    /// Draw the current frame at the stream's native resolution.
    fn read_frame(&mut self) -> Option<FrameData>;

    /// Stop every track. Calling it again is a no-op.
    fn stop(&mut self);

    fn live_tracks(&self) -> usize;
}

/// Device media source: grants or denies camera streams by facing mode
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Request a stream for `facing`. Suspends until the device grants or
    /// denies access.
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>, CameraError>;

    /// Number of physical video inputs
    async fn camera_count(&self) -> Result<usize, CameraError>;
}
