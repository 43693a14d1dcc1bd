mod source;
mod synthetic;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;
#[cfg(test)]
mod tests;

pub use source::{FacingMode, MediaSource, MediaStream, VideoState};
pub use synthetic::{MediaOp, SyntheticMediaSource, SyntheticMediaSourceBuilder};
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::GstMediaSource;
