//! Upload forms that collect captured or selected images for analysis.

use crate::data_uri::DataUri;
use crate::error::{Result, UploadError};
use crate::still::CapturedImage;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Which analysis flow a form feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    /// A selfie plus front and side photos of a frame not yet purchased
    CheckFrame,
    /// Front and side selfies wearing current glasses
    AnalyzeCurrent,
}

impl UploadKind {
    pub fn slots(&self) -> &'static [&'static str] {
        match self {
            UploadKind::CheckFrame => &["selfie", "frameFront", "frameSide"],
            UploadKind::AnalyzeCurrent => &["frontSelfie", "sideSelfie"],
        }
    }
}

/// Map sniffed image bytes to an accepted MIME type
pub fn sniff_mime(bytes: &[u8]) -> std::result::Result<&'static str, UploadError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(ImageFormat::WebP) => Ok("image/webp"),
        Ok(other) => Err(UploadError::UnsupportedImage {
            details: format!("{:?} is not PNG, JPEG or WEBP", other),
        }),
        Err(e) => Err(UploadError::UnsupportedImage {
            details: e.to_string(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct UploadForm {
    kind: UploadKind,
    images: BTreeMap<&'static str, DataUri>,
}

impl UploadForm {
    pub fn new(kind: UploadKind) -> Self {
        Self {
            kind,
            images: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> UploadKind {
        self.kind
    }

    fn resolve_slot(&self, slot: &str) -> std::result::Result<&'static str, UploadError> {
        self.kind
            .slots()
            .iter()
            .copied()
            .find(|name| *name == slot)
            .ok_or_else(|| UploadError::UnknownSlot {
                slot: slot.to_string(),
            })
    }

    /// Take ownership of a capture and place it in `slot`
    pub fn attach_capture(&mut self, slot: &str, image: CapturedImage) -> Result<()> {
        let slot = self.resolve_slot(slot)?;
        let mime = image.mime_type();
        debug!("Attaching {}x{} capture to '{}'", image.width, image.height, slot);
        self.images.insert(slot, DataUri::new(mime, image.into_jpeg()));
        Ok(())
    }

    /// Place raw image bytes in `slot`, rejecting anything but PNG, JPEG or WEBP
    pub fn attach_bytes(&mut self, slot: &str, bytes: Vec<u8>) -> Result<()> {
        let slot = self.resolve_slot(slot)?;
        let mime = sniff_mime(&bytes)?;
        self.images.insert(slot, DataUri::new(mime, bytes));
        Ok(())
    }

    pub async fn attach_file<P: AsRef<Path>>(&mut self, slot: &str, path: P) -> Result<()> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        info!("Attaching {} to '{}'", path.as_ref().display(), slot);
        self.attach_bytes(slot, bytes)
    }

    pub fn remove(&mut self, slot: &str) -> Option<DataUri> {
        self.images.remove(slot)
    }

    pub fn image(&self, slot: &str) -> Option<&DataUri> {
        self.images.get(slot)
    }

    pub fn missing_slots(&self) -> Vec<&'static str> {
        self.kind
            .slots()
            .iter()
            .copied()
            .filter(|slot| !self.images.contains_key(slot))
            .collect()
    }

    pub fn is_analyzable(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Request body for the analysis service, one `<slot>DataUri` field per image
    pub fn to_request(&self) -> Result<Value> {
        let missing = self.missing_slots();
        if !missing.is_empty() {
            return Err(UploadError::Incomplete {
                missing: missing.into_iter().map(String::from).collect(),
            }
            .into());
        }

        let mut body = Map::new();
        for (slot, uri) in &self.images {
            body.insert(format!("{}DataUri", slot), Value::String(uri.to_string()));
        }
        Ok(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FacingMode;
    use crate::error::FramefitError;
    use crate::frame::FrameData;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn capture() -> CapturedImage {
        CapturedImage::encode(&FrameData::solid(1, 8, 8, [9, 9, 9]), 90, FacingMode::User)
            .unwrap()
    }

    #[test]
    fn test_sniff_accepts_supported_formats() {
        assert_eq!(sniff_mime(PNG_MAGIC).unwrap(), "image/png");
        assert_eq!(sniff_mime(capture().jpeg_bytes()).unwrap(), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 ").unwrap(), "image/webp");
        assert!(sniff_mime(b"GIF89a......").is_err());
        assert!(sniff_mime(b"plain text").is_err());
    }

    #[test]
    fn test_check_frame_form_completion() {
        let mut form = UploadForm::new(UploadKind::CheckFrame);
        assert!(!form.is_analyzable());
        assert_eq!(form.missing_slots(), vec!["selfie", "frameFront", "frameSide"]);

        form.attach_capture("selfie", capture()).unwrap();
        form.attach_bytes("frameFront", PNG_MAGIC.to_vec()).unwrap();
        assert!(!form.is_analyzable());

        form.attach_bytes("frameSide", capture().into_jpeg()).unwrap();
        assert!(form.is_analyzable());

        let request = form.to_request().unwrap();
        assert!(request["selfieDataUri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert!(request["frameFrontDataUri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_remove_makes_form_incomplete() {
        let mut form = UploadForm::new(UploadKind::AnalyzeCurrent);
        form.attach_capture("frontSelfie", capture()).unwrap();
        form.attach_capture("sideSelfie", capture()).unwrap();
        assert!(form.is_analyzable());

        assert!(form.remove("sideSelfie").is_some());
        match form.to_request() {
            Err(FramefitError::Upload(UploadError::Incomplete { missing })) => {
                assert_eq!(missing, vec!["sideSelfie".to_string()])
            }
            other => panic!("Expected incomplete upload, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let mut form = UploadForm::new(UploadKind::AnalyzeCurrent);
        assert!(matches!(
            form.attach_capture("selfie", capture()),
            Err(FramefitError::Upload(UploadError::UnknownSlot { .. }))
        ));
    }

    #[tokio::test]
    async fn test_attach_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("frame.png");
        let bad = dir.path().join("notes.txt");
        std::fs::write(&good, PNG_MAGIC).unwrap();
        std::fs::write(&bad, b"not an image").unwrap();

        let mut form = UploadForm::new(UploadKind::CheckFrame);
        form.attach_file("frameFront", &good).await.unwrap();
        assert_eq!(form.image("frameFront").unwrap().mime_type, "image/png");

        assert!(matches!(
            form.attach_file("frameSide", &bad).await,
            Err(FramefitError::Upload(UploadError::UnsupportedImage { .. }))
        ));
        assert!(form.image("frameSide").is_none());
    }
}
