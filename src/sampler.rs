use crate::camera::MediaStream;
use crate::events::{EventBus, SessionEvent};
use crate::lighting::{BrightnessClassifier, LightingFeedback};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

/// Stream handle shared between the session and its sampling task
pub type SharedStream = Arc<Mutex<Box<dyn MediaStream>>>;

/// Latest published lighting feedback; `None` before the first tick
pub type FeedbackSender = Arc<watch::Sender<Option<LightingFeedback>>>;

/// Reads one frame from a stream and classifies its lighting
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    classifier: BrightnessClassifier,
}

impl FrameSampler {
    pub fn new(classifier: BrightnessClassifier) -> Self {
        Self { classifier }
    }

    /// Run one sampling tick. Returns `None` when the tick is skipped.
    pub fn sample(&self, stream: &mut dyn MediaStream) -> Option<LightingFeedback> {
        let state = stream.video_state();
        if !state.is_ready() {
            trace!("Skipping lighting sample, video not ready: {:?}", state);
            return None;
        }

        let frame = stream.read_frame()?;
        if frame.is_empty() || !frame.validate_size() {
            trace!(
                "Skipping lighting sample, unusable {}x{} frame",
                frame.width,
                frame.height
            );
            return None;
        }

        self.classifier.evaluate(&frame)
    }
}

/// Periodic sampling task bound to one stream
pub struct SamplerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Spawn the sampling loop. The first tick fires one period after start.
    pub fn spawn(
        stream: SharedStream,
        sampler: FrameSampler,
        period: Duration,
        feedback: FeedbackSender,
        event_bus: EventBus,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!("Lighting sampler started with {}ms period", period.as_millis());

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        // Publish under the stream lock; teardown stops the stream
                        // under it before clearing feedback.
                        let mut guard = stream.lock();
                        let Some(sample) = sampler.sample(&mut **guard) else {
                            continue;
                        };
                        if task_token.is_cancelled() {
                            break;
                        }

                        trace!(
                            "Lighting sample {:?} (luminance {:.1})",
                            sample.category,
                            sample.average_luminance
                        );
                        feedback.send_replace(Some(sample));
                        if let Err(e) = event_bus.publish(SessionEvent::LightingSampled {
                            category: sample.category,
                            average_luminance: sample.average_luminance,
                            timestamp: sample.sampled_at,
                        }) {
                            error!("Failed to publish lighting sample: {}", e);
                        }
                    }
                }
            }

            debug!("Lighting sampler stopped");
        });

        Self { token, task }
    }

    /// Cancel the loop and wait for it to finish; no tick fires afterwards.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Lighting sampler task failed: {}", e);
            }
        }
    }

    /// Cancel without waiting, for use where awaiting is impossible
    pub fn abort(self) {
        self.token.cancel();
        self.task.abort();
    }
}
