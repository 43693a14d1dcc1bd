//! Schema-shaped results returned by the analysis service, plus the
//! session-scoped store the results view reads them from.

use crate::config::SystemConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key the results view reads
pub const ANALYSIS_RESULTS_KEY: &str = "analysisResults";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    Warning,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCheck {
    pub verdict: Verdict,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitAnalysis {
    pub fit_verdict: String,
    pub frame_width: FitCheck,
    pub bridge_position: FitCheck,
    pub temple_length: FitCheck,
    pub analysis_summary: String,
}

impl FitAnalysis {
    /// Plain-text rendering passed as the report to follow-up chat
    pub fn report_text(&self) -> String {
        let mut text = format!("Overall fit: {}\n", self.fit_verdict);
        for (label, check) in [
            ("Frame width", &self.frame_width),
            ("Bridge position", &self.bridge_position),
            ("Temple length", &self.temple_length),
        ] {
            let _ = writeln!(text, "{} ({:?}): {}", label, check.verdict, check.observation);
        }
        text.push_str(&self.analysis_summary);
        text
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    pub style: String,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeasurements {
    /// Millimetres
    pub lens_width: f64,
    pub bridge_width: f64,
    pub temple_length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_shape: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRecommendation {
    pub suggested_size: String,
    pub similar_shapes: Vec<String>,
    pub recommendation_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: Vec<ChatText>,
}

impl ChatTurn {
    pub fn new<S: Into<String>>(role: ChatRole, text: S) -> Self {
        Self {
            role,
            content: vec![ChatText { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub report: String,
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// Conversation about one report
#[derive(Debug, Clone, Default)]
pub struct ReportChat {
    report: String,
    history: Vec<ChatTurn>,
}

impl ReportChat {
    pub fn new<S: Into<String>>(report: S) -> Self {
        Self {
            report: report.into(),
            history: Vec::new(),
        }
    }

    /// Build the request for `question` with all prior turns
    pub fn ask<S: Into<String>>(&self, question: S) -> ChatRequest {
        ChatRequest {
            report: self.report.clone(),
            question: question.into(),
            history: self.history.clone(),
        }
    }

    /// Record a completed exchange
    pub fn record(&mut self, request: ChatRequest, answer: &ChatAnswer) {
        self.history.push(ChatTurn::new(ChatRole::User, request.question));
        self.history
            .push(ChatTurn::new(ChatRole::Model, answer.answer.clone()));
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredResult<T> {
    saved_at: DateTime<Utc>,
    payload: T,
}

/// Session-scoped JSON result blobs, one file per key
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(&config.results_dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let stored = StoredResult {
            saved_at: Utc::now(),
            payload,
        };
        let json = serde_json::to_vec_pretty(&stored)?;
        tokio::fs::write(self.path_for(key), json).await?;
        info!("Stored result '{}' in {}", key, self.dir.display());
        Ok(())
    }

    /// Load a stored result; `None` when nothing was stored under `key`
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored result '{}'", key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredResult<T> = serde_json::from_slice(&bytes)?;
        Ok(Some(stored.payload))
    }

    /// Remove the result under `key`, returning whether one existed
    pub async fn clear(&self, key: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> FitAnalysis {
        FitAnalysis {
            fit_verdict: "Slightly Wide".to_string(),
            frame_width: FitCheck {
                verdict: Verdict::Warning,
                observation: "Frames extend past the temples.".to_string(),
            },
            bridge_position: FitCheck {
                verdict: Verdict::Good,
                observation: "Bridge sits flush on the nose.".to_string(),
            },
            temple_length: FitCheck {
                verdict: Verdict::Good,
                observation: "Arms curve neatly behind the ear.".to_string(),
            },
            analysis_summary: "Consider a narrower frame.".to_string(),
        }
    }

    #[test]
    fn test_fit_analysis_uses_service_field_names() {
        let json = serde_json::to_value(sample_analysis()).unwrap();
        assert_eq!(json["fitVerdict"], "Slightly Wide");
        assert_eq!(json["frameWidth"]["verdict"], "warning");
        assert!(json.get("analysisSummary").is_some());
    }

    #[test]
    fn test_parse_service_outputs() {
        let style: FrameStyle =
            serde_json::from_str(r#"{"style":"aviator","confidence":0.82}"#).unwrap();
        assert_eq!(style.style, "aviator");

        let size: SizeRecommendation = serde_json::from_str(
            r#"{"suggestedSize":"Medium","similarShapes":["round","oval"],"recommendationText":"ok"}"#,
        )
        .unwrap();
        assert_eq!(size.similar_shapes.len(), 2);

        let bad = serde_json::from_str::<FitCheck>(r#"{"verdict":"great","observation":""}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_measurements_omit_missing_face_shape() {
        let json = serde_json::to_value(FrameMeasurements {
            lens_width: 52.0,
            bridge_width: 18.0,
            temple_length: 140.0,
            face_shape: None,
        })
        .unwrap();
        assert_eq!(json["lensWidth"], 52.0);
        assert!(json.get("faceShape").is_none());
    }

    #[test]
    fn test_report_chat_accumulates_history() {
        let report = sample_analysis().report_text();
        assert!(report.contains("Frame width (Warning)"));

        let mut chat = ReportChat::new(report.clone());
        let first = chat.ask("Should I resize?");
        assert!(first.history.is_empty());

        chat.record(
            first,
            &ChatAnswer {
                answer: "A narrower frame would help.".to_string(),
            },
        );

        let second = chat.ask("Which shapes?");
        assert_eq!(second.report, report);
        assert_eq!(second.history.len(), 2);
        assert_eq!(second.history[0].role, ChatRole::User);
        assert_eq!(second.history[1].role, ChatRole::Model);

        let json = serde_json::to_value(&second).unwrap();
        assert_eq!(json["history"][1]["role"], "model");
        assert_eq!(json["history"][0]["content"][0]["text"], "Should I resize?");
    }

    #[test]
    fn test_chat_request_without_history() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"report":"Overall fit: Good","question":"Why?"}"#).unwrap();
        assert_eq!(request.question, "Why?");
        assert!(request.history.is_empty());
    }

    #[tokio::test]
    async fn test_result_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("session"));

        let missing: Option<FitAnalysis> = store.load(ANALYSIS_RESULTS_KEY).await.unwrap();
        assert!(missing.is_none());

        store.save(ANALYSIS_RESULTS_KEY, &sample_analysis()).await.unwrap();
        let loaded: Option<FitAnalysis> = store.load(ANALYSIS_RESULTS_KEY).await.unwrap();
        assert_eq!(loaded, Some(sample_analysis()));

        assert!(store.clear(ANALYSIS_RESULTS_KEY).await.unwrap());
        assert!(!store.clear(ANALYSIS_RESULTS_KEY).await.unwrap());
    }

    #[test]
    fn test_result_store_from_config() {
        let config = crate::config::FramefitConfig::default();
        let store = ResultStore::from_config(&config.system);
        assert_eq!(store.dir(), Path::new("./results"));
    }
}
