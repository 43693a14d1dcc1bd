use crate::camera::FacingMode;
use crate::data_uri;
use crate::error::{CameraError, Result};
use crate::frame::FrameData;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub const JPEG_MIME: &str = "image/jpeg";

/// A still frame encoded as JPEG, handed off to the caller on capture.
///
/// The capture session keeps no reference to it once returned.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
    pub facing_mode: FacingMode,
    pub captured_at: DateTime<Utc>,
    jpeg: Vec<u8>,
}

impl CapturedImage {
    /// Encode a frame at its native resolution
    pub fn encode(frame: &FrameData, quality: u8, facing_mode: FacingMode) -> Result<Self> {
        if frame.is_empty() || !frame.validate_size() {
            return Err(CameraError::FrameNotReady {
                width: frame.width,
                height: frame.height,
            }
            .into());
        }

        let rgb = frame.to_rgb();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode(&rgb, frame.width, frame.height, ColorType::Rgb8)
            .map_err(|e| CameraError::Encoding {
                details: e.to_string(),
            })?;

        debug!(
            "Encoded {}x{} still as {} byte JPEG",
            frame.width,
            frame.height,
            jpeg.len()
        );

        Ok(Self {
            id: Uuid::new_v4(),
            width: frame.width,
            height: frame.height,
            facing_mode,
            captured_at: Utc::now(),
            jpeg,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn into_jpeg(self) -> Vec<u8> {
        self.jpeg
    }

    /// `data:image/jpeg;base64,...` form used by the upload workflow
    pub fn to_data_uri(&self) -> String {
        data_uri::encode(JPEG_MIME, &self.jpeg)
    }

    pub async fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tokio::fs::write(path, &self.jpeg).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FramefitError;
    use crate::frame::FrameFormat;
    use std::time::SystemTime;

    #[test]
    fn test_encode_keeps_native_dimensions() {
        let frame = FrameData::solid(1, 320, 240, [120, 130, 140]);
        let image = CapturedImage::encode(&frame, 90, FacingMode::User).unwrap();

        assert_eq!((image.width, image.height), (320, 240));
        let decoded = image::load_from_memory(image.jpeg_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let frame = FrameData::solid(1, 8, 8, [0, 0, 0]);
        let image = CapturedImage::encode(&frame, 80, FacingMode::Environment).unwrap();
        let uri = image.to_data_uri();

        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let parsed = data_uri::DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.data, image.jpeg_bytes());
    }

    #[test]
    fn test_encode_rejects_empty_frame() {
        let frame = FrameData::new(0, SystemTime::now(), Vec::new(), 0, 0, FrameFormat::Rgba8);
        let result = CapturedImage::encode(&frame, 90, FacingMode::User);
        assert!(matches!(
            result,
            Err(FramefitError::Camera(CameraError::FrameNotReady { .. }))
        ));
    }

    #[tokio::test]
    async fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.jpg");
        let frame = FrameData::solid(1, 16, 16, [200, 10, 10]);
        let image = CapturedImage::encode(&frame, 90, FacingMode::User).unwrap();

        image.write_to(&path).await.unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, image.jpeg_bytes());
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Jpeg);
    }
}
