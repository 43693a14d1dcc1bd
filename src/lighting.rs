//! Ambient lighting estimation from sampled frame luminance.

use crate::config::LightingConfig;
use crate::frame::FrameData;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Lighting quality derived from the average luminance of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingCategory {
    TooDark,
    TooBright,
    Good,
}

impl LightingCategory {
    /// Hint shown to the user. Good lighting carries no message.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LightingCategory::TooDark => Some("Too dark. Move to a brighter spot."),
            LightingCategory::TooBright => Some("Too bright. Avoid direct light on your face."),
            LightingCategory::Good => None,
        }
    }
}

/// Luminance thresholds. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingThresholds {
    pub too_dark_below: f64,
    pub too_bright_above: f64,
}

impl Default for LightingThresholds {
    fn default() -> Self {
        Self {
            too_dark_below: 70.0,
            too_bright_above: 180.0,
        }
    }
}

impl From<&LightingConfig> for LightingThresholds {
    fn from(config: &LightingConfig) -> Self {
        Self {
            too_dark_below: config.too_dark_below,
            too_bright_above: config.too_bright_above,
        }
    }
}

impl LightingThresholds {
    pub fn classify(&self, average_luminance: f64) -> LightingCategory {
        if average_luminance < self.too_dark_below {
            LightingCategory::TooDark
        } else if average_luminance > self.too_bright_above {
            LightingCategory::TooBright
        } else {
            LightingCategory::Good
        }
    }
}

/// One published lighting sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingFeedback {
    pub category: LightingCategory,
    pub average_luminance: f64,
    pub frame_id: u64,
    pub sampled_at: SystemTime,
}

/// Perceptual luminance of one pixel (ITU-R BT.601 weights)
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Average luminance over every `stride`-th pixel of the frame.
///
/// Returns `None` when the frame has no pixels to sample.
pub fn average_luminance(frame: &FrameData, stride: usize) -> Option<f64> {
    let bpp = frame.format.bytes_per_pixel();
    let mut total = 0.0;
    let mut count = 0usize;

    for px in frame.data.chunks_exact(bpp).step_by(stride.max(1)) {
        total += luminance(px[0], px[1], px[2]);
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Stateless brightness classifier configured with a stride and thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessClassifier {
    pub pixel_stride: usize,
    pub thresholds: LightingThresholds,
}

impl BrightnessClassifier {
    pub fn new(config: &LightingConfig) -> Self {
        Self {
            pixel_stride: config.pixel_stride,
            thresholds: LightingThresholds::from(config),
        }
    }

    pub fn evaluate(&self, frame: &FrameData) -> Option<LightingFeedback> {
        let average = average_luminance(frame, self.pixel_stride)?;
        Some(LightingFeedback {
            category: self.thresholds.classify(average),
            average_luminance: average,
            frame_id: frame.id,
            sampled_at: frame.timestamp,
        })
    }
}

impl Default for BrightnessClassifier {
    fn default() -> Self {
        Self::new(&LightingConfig::default())
    }
}
