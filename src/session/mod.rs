mod builder;
mod controller;
mod types;

pub use builder::CaptureSessionBuilder;
pub use controller::CaptureSession;
pub use types::SessionStatus;
