use crate::error::UploadError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;

/// A `data:<mime>;base64,<payload>` image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn new<S: Into<String>>(mime_type: S, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn parse(input: &str) -> Result<Self, UploadError> {
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::MalformedDataUri {
                details: "missing 'data:' scheme".to_string(),
            })?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| UploadError::MalformedDataUri {
                details: "missing ',' separator".to_string(),
            })?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| UploadError::MalformedDataUri {
                details: "only base64 payloads are supported".to_string(),
            })?;

        if mime_type.is_empty() {
            return Err(UploadError::MalformedDataUri {
                details: "missing MIME type".to_string(),
            });
        }

        let data = STANDARD
            .decode(payload)
            .map_err(|e| UploadError::MalformedDataUri {
                details: e.to_string(),
            })?;

        Ok(Self::new(mime_type, data))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

impl FromStr for DataUri {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encode raw bytes as a base64 data URI
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}
