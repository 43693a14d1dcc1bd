use super::source::{FacingMode, MediaSource, MediaStream, VideoState};
use crate::config::SyntheticConfig;
use crate::error::CameraError;
use crate::frame::FrameData;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Device-level operation recorded by the synthetic source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOp {
    Acquire(FacingMode),
    Denied(FacingMode),
    Stop(FacingMode),
}

struct Shared {
    level: AtomicU8,
    live: AtomicUsize,
    max_live: AtomicUsize,
    frames_read: AtomicUsize,
    journal: Mutex<Vec<MediaOp>>,
}

impl Shared {
    fn record(&self, op: MediaOp) {
        self.journal.lock().push(op);
    }
}

/// In-process media source producing solid gray frames.
///
/// Runs without camera hardware and keeps a journal of every acquire and
/// stop so callers can verify release-before-acquire ordering.
#[derive(Clone)]
pub struct SyntheticMediaSource {
    resolution: (u32, u32),
    camera_count: usize,
    deny_permission: bool,
    warmup: Duration,
    shared: Arc<Shared>,
}

impl SyntheticMediaSource {
    pub fn builder() -> SyntheticMediaSourceBuilder {
        SyntheticMediaSourceBuilder::default()
    }

    pub fn from_config(config: &SyntheticConfig, resolution: (u32, u32)) -> Self {
        Self::builder()
            .resolution(resolution)
            .luminance(config.luminance)
            .camera_count(config.camera_count)
            .deny_permission(config.deny_permission)
            .build()
    }

    /// Change the gray level of frames produced from now on
    pub fn set_luminance(&self, level: u8) {
        self.shared.level.store(level, Ordering::Relaxed);
    }

    pub fn journal(&self) -> Vec<MediaOp> {
        self.shared.journal.lock().clone()
    }

    /// Streams currently holding a live track
    pub fn live_streams(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live streams ever observed
    pub fn max_live_streams(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }

    pub fn frames_read(&self) -> usize {
        self.shared.frames_read.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>, CameraError> {
        // Permission prompts resolve asynchronously
        tokio::task::yield_now().await;

        if self.deny_permission {
            self.shared.record(MediaOp::Denied(facing));
            return Err(CameraError::PermissionDenied {
                details: "synthetic source configured to deny access".to_string(),
            });
        }

        if self.camera_count == 0 {
            self.shared.record(MediaOp::Denied(facing));
            return Err(CameraError::NotAvailable {
                facing: facing.to_string(),
            });
        }

        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);
        self.shared.record(MediaOp::Acquire(facing));

        info!(
            "Synthetic {} camera streaming at {}x{}",
            facing, self.resolution.0, self.resolution.1
        );

        Ok(Box::new(SyntheticStream {
            facing,
            resolution: self.resolution,
            ready_at: Instant::now() + self.warmup,
            frame_counter: 0,
            stopped: false,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn camera_count(&self) -> Result<usize, CameraError> {
        Ok(self.camera_count)
    }
}

struct SyntheticStream {
    facing: FacingMode,
    resolution: (u32, u32),
    ready_at: Instant,
    frame_counter: u64,
    stopped: bool,
    shared: Arc<Shared>,
}

impl MediaStream for SyntheticStream {
    fn facing_mode(&self) -> FacingMode {
        self.facing
    }

    fn video_state(&mut self) -> VideoState {
        // Dimensions stay zero until metadata would have loaded
        let (width, height) = if Instant::now() >= self.ready_at {
            self.resolution
        } else {
            (0, 0)
        };

        VideoState {
            paused: false,
            ended: self.stopped,
            width,
            height,
        }
    }

    fn read_frame(&mut self) -> Option<FrameData> {
        if self.stopped || Instant::now() < self.ready_at {
            return None;
        }

        let level = self.shared.level.load(Ordering::Relaxed);
        self.frame_counter += 1;
        self.shared.frames_read.fetch_add(1, Ordering::SeqCst);
        trace!("Synthetic frame {} at level {}", self.frame_counter, level);

        Some(FrameData::solid(
            self.frame_counter,
            self.resolution.0,
            self.resolution.1,
            [level, level, level],
        ))
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.shared.live.fetch_sub(1, Ordering::SeqCst);
        self.shared.record(MediaOp::Stop(self.facing));
        debug!("Synthetic {} camera track stopped", self.facing);
    }

    fn live_tracks(&self) -> usize {
        if self.stopped {
            0
        } else {
            1
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for [`SyntheticMediaSource`]
pub struct SyntheticMediaSourceBuilder {
    resolution: (u32, u32),
    luminance: u8,
    camera_count: usize,
    deny_permission: bool,
    warmup: Duration,
}

impl Default for SyntheticMediaSourceBuilder {
    fn default() -> Self {
        Self {
            resolution: (640, 480),
            luminance: 128,
            camera_count: 1,
            deny_permission: false,
            warmup: Duration::ZERO,
        }
    }
}

impl SyntheticMediaSourceBuilder {
    pub fn resolution(mut self, resolution: (u32, u32)) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn luminance(mut self, level: u8) -> Self {
        self.luminance = level;
        self
    }

    pub fn camera_count(mut self, count: usize) -> Self {
        self.camera_count = count;
        self
    }

    pub fn deny_permission(mut self, deny: bool) -> Self {
        self.deny_permission = deny;
        self
    }

    /// Delay before a new stream reports its dimensions
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn build(self) -> SyntheticMediaSource {
        SyntheticMediaSource {
            resolution: self.resolution,
            camera_count: self.camera_count,
            deny_permission: self.deny_permission,
            warmup: self.warmup,
            shared: Arc::new(Shared {
                level: AtomicU8::new(self.luminance),
                live: AtomicUsize::new(0),
                max_live: AtomicUsize::new(0),
                frames_read: AtomicUsize::new(0),
                journal: Mutex::new(Vec::new()),
            }),
        }
    }
}
