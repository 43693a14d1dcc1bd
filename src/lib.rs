pub mod app;
pub mod camera;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod events;
pub mod frame;
pub mod lighting;
pub mod report;
pub mod sampler;
pub mod session;
pub mod still;
pub mod upload;

pub use config::FramefitConfig;
pub use error::{CameraError, FramefitError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, SessionEvent};
pub use frame::{FrameData, FrameFormat};
pub use lighting::{BrightnessClassifier, LightingCategory, LightingFeedback, LightingThresholds};
pub use camera::{FacingMode, MediaSource, MediaStream, SyntheticMediaSource};
pub use sampler::{FrameSampler, SamplerHandle};
pub use session::{CaptureSession, CaptureSessionBuilder, SessionStatus};
pub use still::CapturedImage;
pub use upload::{UploadForm, UploadKind};
