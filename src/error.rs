use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramefitError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("System error: {message}")]
    System { message: String },
}

impl FramefitError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Errors raised by the device media source and the capture session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied: {details}")]
    PermissionDenied { details: String },

    #[error("No camera available for {facing} facing mode")]
    NotAvailable { facing: String },

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("Capture stream failed: {details}")]
    CaptureStream { details: String },

    #[error("Capture requested while the session is not streaming")]
    NotStreaming,

    #[error("Stream has no frame ready ({width}x{height})")]
    FrameNotReady { width: u32, height: u32 },

    #[error("Still image encoding failed: {details}")]
    Encoding { details: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unknown upload slot '{slot}'")]
    UnknownSlot { slot: String },

    #[error("Unsupported image type: {details}")]
    UnsupportedImage { details: String },

    #[error("Malformed data URI: {details}")]
    MalformedDataUri { details: String },

    #[error("Upload is missing required images: {missing:?}")]
    Incomplete { missing: Vec<String> },
}

pub type Result<T> = std::result::Result<T, FramefitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concern_errors_convert_into_top_level() {
        let camera: FramefitError = CameraError::Encoding {
            details: "bad quality".to_string(),
        }
        .into();
        assert!(matches!(camera, FramefitError::Camera(CameraError::Encoding { .. })));
        assert_eq!(camera.to_string(), "Camera error: Still image encoding failed: bad quality");

        let upload: FramefitError = UploadError::UnsupportedImage {
            details: "Gif".to_string(),
        }
        .into();
        assert!(matches!(upload, FramefitError::Upload(UploadError::UnsupportedImage { .. })));
    }
}
