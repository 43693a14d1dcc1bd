use super::types::SessionStatus;
use crate::camera::{FacingMode, MediaSource};
use crate::config::{CameraConfig, FramefitConfig, LightingConfig};
use crate::error::{CameraError, Result};
use crate::events::{EventBus, SessionEvent};
use crate::lighting::{BrightnessClassifier, LightingFeedback};
use crate::sampler::{FeedbackSender, FrameSampler, SamplerHandle, SharedStream};
use crate::still::CapturedImage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// One open camera dialog: owns at most one live stream and its sampler.
///
/// Every exit path (close, switch, denial, drop) goes through the same
/// release sequence: cancel the sampler, stop all tracks, clear feedback.
pub struct CaptureSession {
    source: Arc<dyn MediaSource>,
    camera: CameraConfig,
    lighting: LightingConfig,
    status: SessionStatus,
    facing_mode: FacingMode,
    stream: Option<SharedStream>,
    available_camera_count: Option<usize>,
    feedback: FeedbackSender,
    sampler: Option<SamplerHandle>,
    event_bus: EventBus,
}

impl CaptureSession {
    pub fn new(source: Arc<dyn MediaSource>, config: &FramefitConfig, event_bus: EventBus) -> Self {
        let (feedback, _) = watch::channel(None);

        Self {
            source,
            camera: config.camera.clone(),
            lighting: config.lighting.clone(),
            status: SessionStatus::Closed,
            facing_mode: config.camera.initial_facing,
            stream: None,
            available_camera_count: None,
            feedback: Arc::new(feedback),
            sampler: None,
            event_bus,
        }
    }

    /// Request a stream for `facing` and start lighting feedback.
    ///
    /// A session that is not closed is closed first, so the previous
    /// stream is fully released before the new one is requested. On
    /// denial the session passes through `PermissionDenied` and ends
    /// `Closed` with nothing attached.
    pub async fn open(&mut self, facing: FacingMode) -> Result<()> {
        if self.status != SessionStatus::Closed {
            debug!("Session is {:?}; closing before reopening", self.status);
            self.close().await;
        }

        self.facing_mode = facing;
        self.set_status(SessionStatus::RequestingPermission);
        info!("Requesting {} camera", facing);

        if self.available_camera_count.is_none() {
            let count = match self.source.camera_count().await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Failed to enumerate cameras: {}", e);
                    0
                }
            };
            debug!("{} cameras available", count);
            self.available_camera_count = Some(count);
        }

        match self.source.acquire(facing).await {
            Ok(stream) => {
                let stream: SharedStream = Arc::new(Mutex::new(stream));
                self.stream = Some(Arc::clone(&stream));
                self.set_status(SessionStatus::Streaming);

                self.sampler = Some(SamplerHandle::spawn(
                    stream,
                    FrameSampler::new(BrightnessClassifier::new(&self.lighting)),
                    self.lighting.sample_interval(),
                    Arc::clone(&self.feedback),
                    self.event_bus.clone(),
                ));

                info!("{} camera streaming", facing);
                Ok(())
            }
            Err(e) => {
                self.set_status(SessionStatus::PermissionDenied);
                self.publish(SessionEvent::PermissionDenied {
                    facing,
                    reason: e.to_string(),
                    timestamp: SystemTime::now(),
                });
                self.close().await;
                Err(e.into())
            }
        }
    }

    /// Stop sampling, release every track and clear feedback.
    ///
    /// Safe to call repeatedly and from any state.
    pub async fn close(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.stop().await;
        }

        self.release_stream();
        self.feedback.send_replace(None);

        if self.status != SessionStatus::Closed {
            self.set_status(SessionStatus::Closed);
            info!("Capture session closed");
        }
    }

    /// Whether more than one camera exists to switch between
    pub fn can_switch_camera(&self) -> bool {
        self.available_camera_count.unwrap_or(0) > 1
    }

    /// Reopen on the opposite facing mode.
    ///
    /// Returns `Ok(false)` without touching the stream when switching is
    /// not offered or the session is not streaming.
    pub async fn switch_camera(&mut self) -> Result<bool> {
        if !self.can_switch_camera() {
            debug!(
                "Camera switch unavailable ({:?} cameras)",
                self.available_camera_count
            );
            return Ok(false);
        }

        if self.status != SessionStatus::Streaming {
            debug!("Camera switch ignored while {:?}", self.status);
            return Ok(false);
        }

        let from = self.facing_mode;
        let to = from.opposite();

        self.close().await;
        self.open(to).await?;

        self.publish(SessionEvent::CameraSwitched {
            from,
            to,
            timestamp: SystemTime::now(),
        });
        Ok(true)
    }

    /// Capture the current frame at the stream's native resolution.
    pub fn capture(&self) -> Result<CapturedImage> {
        if self.status != SessionStatus::Streaming {
            return Err(CameraError::NotStreaming.into());
        }
        let stream = self.stream.as_ref().ok_or(CameraError::NotStreaming)?;

        let frame = {
            let mut guard = stream.lock();
            let state = guard.video_state();
            if !state.has_dimensions() {
                return Err(CameraError::FrameNotReady {
                    width: state.width,
                    height: state.height,
                }
                .into());
            }
            guard.read_frame().ok_or(CameraError::FrameNotReady {
                width: state.width,
                height: state.height,
            })?
        };

        let image = CapturedImage::encode(&frame, self.camera.jpeg_quality, self.facing_mode)?;
        info!(
            "Captured {}x{} still from {} camera",
            image.width, image.height, self.facing_mode
        );

        self.publish(SessionEvent::FrameCaptured {
            capture_id: image.id.to_string(),
            width: image.width,
            height: image.height,
            timestamp: SystemTime::now(),
        });

        Ok(image)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    pub fn available_camera_count(&self) -> usize {
        self.available_camera_count.unwrap_or(0)
    }

    /// Capture is only offered while streaming
    pub fn can_capture(&self) -> bool {
        self.status == SessionStatus::Streaming
    }

    /// Latest lighting feedback, absent before the first tick
    pub fn feedback(&self) -> Option<LightingFeedback> {
        *self.feedback.borrow()
    }

    pub fn subscribe_feedback(&self) -> watch::Receiver<Option<LightingFeedback>> {
        self.feedback.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Live tracks held by this session
    pub fn active_track_count(&self) -> usize {
        self.stream
            .as_ref()
            .map(|stream| stream.lock().live_tracks())
            .unwrap_or(0)
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            let facing = {
                let mut guard = stream.lock();
                guard.stop();
                guard.facing_mode()
            };
            debug!("Released {} camera stream", facing);
            self.publish(SessionEvent::StreamReleased {
                facing,
                timestamp: SystemTime::now(),
            });
        }
    }

    fn set_status(&mut self, next: SessionStatus) {
        let previous = self.status;
        if previous == next {
            return;
        }
        if !previous.can_transition_to(next) {
            warn!("Unexpected session transition {:?} -> {:?}", previous, next);
        }

        self.status = next;
        debug!("Session status {:?} -> {:?}", previous, next);
        self.publish(SessionEvent::StatusChanged {
            from: previous,
            to: next,
            timestamp: SystemTime::now(),
        });
    }

    fn publish(&self, event: SessionEvent) {
        if let Err(e) = self.event_bus.publish(event) {
            error!("Failed to publish session event: {}", e);
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.abort();
        }
        if let Some(stream) = self.stream.take() {
            stream.lock().stop();
        }
        self.feedback.send_replace(None);
    }
}
