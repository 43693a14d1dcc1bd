use crate::camera::FacingMode;
use crate::lighting::LightingFeedback;
use crate::still::CapturedImage;
use std::path::PathBuf;

/// Why a run stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
}

/// What a single CLI run should do with the session
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub facing: FacingMode,
    /// Lighting samples to collect before capturing
    pub ticks: usize,
    /// Switch to the opposite camera once streaming
    pub switch_camera: bool,
    /// Where to write the captured JPEG; no capture when `None`
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub samples: Vec<LightingFeedback>,
    pub capture: Option<CapturedImage>,
    pub interrupted: bool,
}
