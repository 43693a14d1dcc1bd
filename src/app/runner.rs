use super::types::{RunOutcome, RunPlan};
use crate::camera::MediaSource;
use crate::config::FramefitConfig;
use crate::data_uri;
use crate::error::{FramefitError, Result};
use crate::events::EventBus;
use crate::lighting::LightingFeedback;
use crate::session::{CaptureSession, CaptureSessionBuilder};
use crate::still::JPEG_MIME;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Drives one capture session from the command line
pub struct CaptureApp {
    session: CaptureSession,
    shutdown: CancellationToken,
}

impl CaptureApp {
    pub fn new(config: FramefitConfig, source: Arc<dyn MediaSource>) -> Result<Self> {
        let event_bus = EventBus::with_debug_logging(config.system.event_bus_capacity);
        let session = CaptureSessionBuilder::new()
            .source(source)
            .config(config)
            .event_bus(event_bus)
            .build()?;

        Ok(Self {
            session,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token that stops the run early when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Open, sample, optionally switch and capture, then always close.
    pub async fn run(&mut self, plan: &RunPlan) -> Result<RunOutcome> {
        let mut feedback = self.session.subscribe_feedback();

        if let Err(e) = self.session.open(plan.facing).await {
            error!("Failed to open {} camera: {}", plan.facing, e);
            return Err(e);
        }

        let outcome = self.drive(plan, &mut feedback).await;
        self.session.close().await;
        outcome
    }

    async fn drive(
        &mut self,
        plan: &RunPlan,
        feedback: &mut watch::Receiver<Option<LightingFeedback>>,
    ) -> Result<RunOutcome> {
        if plan.switch_camera {
            if self.session.switch_camera().await? {
                println!("Switched to {} camera", self.session.facing_mode());
            } else {
                warn!("Camera switching is not available on this device");
            }
        }

        let mut samples = Vec::with_capacity(plan.ticks);
        while samples.len() < plan.ticks {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Run interrupted after {} lighting samples", samples.len());
                    return Ok(RunOutcome {
                        samples,
                        capture: None,
                        interrupted: true,
                    });
                }
                changed = feedback.changed() => {
                    changed.map_err(|_| FramefitError::system("Lighting feedback channel closed"))?;
                    let latest = *feedback.borrow_and_update();
                    if let Some(sample) = latest {
                        match sample.category.message() {
                            Some(message) => println!(
                                "[{:>5.1}] {}",
                                sample.average_luminance, message
                            ),
                            None => println!("[{:>5.1}] Lighting looks good", sample.average_luminance),
                        }
                        samples.push(sample);
                    }
                }
            }
        }

        let capture = match &plan.output {
            Some(path) => {
                let image = self.session.capture()?;
                image.write_to(path).await?;
                let uri_path = path.with_extension("datauri");
                tokio::fs::write(&uri_path, data_uri::encode(JPEG_MIME, image.jpeg_bytes()))
                    .await?;
                info!(
                    "Wrote {}x{} capture to {} and {}",
                    image.width,
                    image.height,
                    path.display(),
                    uri_path.display()
                );
                Some(image)
            }
            None => None,
        };

        Ok(RunOutcome {
            samples,
            capture,
            interrupted: false,
        })
    }
}
