use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Pixel layout of a raw frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// 8-bit RGBA, the layout a canvas read-back produces
    Rgba8,
    /// 8-bit packed RGB
    Rgb24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Rgba8 => 4,
            FrameFormat::Rgb24 => 3,
        }
    }
}

/// A still frame read back from a live stream at its native resolution
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Per-stream frame sequence number
    pub id: u64,
    /// Timestamp when the frame was read back
    pub timestamp: SystemTime,
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    pub format: FrameFormat,
}

impl FrameData {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data,
            width,
            height,
            format,
        }
    }

    /// Build a frame of a single solid color
    pub fn solid(id: u64, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 0xFF]);
        }
        Self::new(id, SystemTime::now(), data, width, height, FrameFormat::Rgba8)
    }

    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Convert to packed RGB, dropping alpha when present
    pub fn to_rgb(&self) -> Vec<u8> {
        match self.format {
            FrameFormat::Rgb24 => self.data.clone(),
            FrameFormat::Rgba8 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        }
    }
}
