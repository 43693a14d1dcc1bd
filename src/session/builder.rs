use super::controller::CaptureSession;
use crate::camera::MediaSource;
use crate::config::FramefitConfig;
use crate::error::{FramefitError, Result};
use crate::events::EventBus;
use std::sync::Arc;

/// Builder for [`CaptureSession`]
pub struct CaptureSessionBuilder {
    source: Option<Arc<dyn MediaSource>>,
    config: Option<FramefitConfig>,
    event_bus: Option<EventBus>,
}

impl CaptureSessionBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            config: None,
            event_bus: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn MediaSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(mut self, config: FramefitConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<CaptureSession> {
        let source = self
            .source
            .ok_or_else(|| FramefitError::system("Media source must be specified"))?;
        let config = self.config.unwrap_or_default();
        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(config.system.event_bus_capacity));

        Ok(CaptureSession::new(source, &config, event_bus))
    }
}

impl Default for CaptureSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
