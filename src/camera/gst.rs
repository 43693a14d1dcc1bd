use super::source::{FacingMode, MediaSource, MediaStream, VideoState};
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// GStreamer-backed V4L2 media source
pub struct GstMediaSource {
    config: CameraConfig,
}

impl GstMediaSource {
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        Ok(Self { config })
    }

    fn device_for(&self, facing: FacingMode) -> u32 {
        match facing {
            FacingMode::User => self.config.user_device,
            FacingMode::Environment => self.config.environment_device,
        }
    }

    fn build_pipeline_string(&self, device_index: u32) -> String {
        let (width, height) = self.config.resolution;
        let fps = self.config.fps;

        format!(
            "v4l2src device=/dev/video{} ! \
             video/x-raw,width={},height={},framerate={}/1 ! \
             videoconvert ! \
             video/x-raw,format=RGBA ! \
             appsink name=sink sync=false max-buffers=1 drop=true",
            device_index, width, height, fps
        )
    }
}

#[async_trait]
impl MediaSource for GstMediaSource {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>, CameraError> {
        let device_index = self.device_for(facing);
        let device_path = format!("/dev/video{}", device_index);

        if !Path::new(&device_path).exists() {
            return Err(CameraError::NotAvailable {
                facing: facing.to_string(),
            });
        }

        let pipeline_desc = self.build_pipeline_string(device_index);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::Configuration {
                details: "Failed to get appsink element".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to AppSink".to_string(),
            })?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            return Err(abandon_pipeline(
                &pipeline,
                CameraError::PermissionDenied {
                    details: format!("Failed to start {}: {}", device_path, e),
                },
            ));
        }

        // Block off the runtime until the device has prerolled or refused
        let waiting = pipeline.clone();
        let (result, _, _) = match tokio::task::spawn_blocking(move || {
            waiting.state(gstreamer::ClockTime::from_seconds(5))
        })
        .await
        {
            Ok(state) => state,
            Err(e) => {
                return Err(abandon_pipeline(
                    &pipeline,
                    CameraError::CaptureStream {
                        details: format!("Preroll wait failed: {}", e),
                    },
                ));
            }
        };

        if let Err(e) = result {
            return Err(abandon_pipeline(
                &pipeline,
                CameraError::PermissionDenied {
                    details: format!("{} did not start streaming: {}", device_path, e),
                },
            ));
        }

        info!("GStreamer {} camera streaming from {}", facing, device_path);

        Ok(Box::new(GstMediaStream {
            facing,
            pipeline,
            appsink,
            latest: None,
            frame_counter: 0,
            stopped: false,
        }))
    }

    async fn camera_count(&self) -> Result<usize, CameraError> {
        tokio::task::spawn_blocking(|| {
            let monitor = gstreamer::DeviceMonitor::new();
            monitor.add_filter(Some("Video/Source"), None);
            monitor.start().map_err(|e| CameraError::Configuration {
                details: format!("Failed to start device monitor: {}", e),
            })?;
            let count = monitor.devices().into_iter().count();
            monitor.stop();
            debug!("Device monitor found {} video sources", count);
            Ok(count)
        })
        .await
        .map_err(|e| CameraError::Configuration {
            details: format!("Device enumeration failed: {}", e),
        })?
    }
}

/// Return a failed pipeline to `Null` before it is dropped
fn abandon_pipeline(pipeline: &Pipeline, error: CameraError) -> CameraError {
    if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
        warn!("Failed to reset abandoned pipeline: {}", e);
    }
    error
}

struct GstMediaStream {
    facing: FacingMode,
    pipeline: Pipeline,
    appsink: AppSink,
    latest: Option<FrameData>,
    frame_counter: u64,
    stopped: bool,
}

impl GstMediaStream {
    /// Drain pending samples, keeping the newest one
    fn refresh(&mut self) {
        if self.stopped {
            return;
        }

        while let Some(sample) = self.appsink.try_pull_sample(gstreamer::ClockTime::ZERO) {
            match Self::sample_to_frame(&sample, self.frame_counter + 1) {
                Ok(frame) => {
                    self.frame_counter += 1;
                    self.latest = Some(frame);
                }
                Err(e) => {
                    warn!("Dropping unreadable GStreamer sample: {}", e);
                }
            }
        }
    }

    fn sample_to_frame(sample: &gstreamer::Sample, id: u64) -> Result<FrameData, CameraError> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::CaptureStream {
            details: "No buffer in sample".to_string(),
        })?;

        let caps = sample.caps().ok_or_else(|| CameraError::CaptureStream {
            details: "No caps in sample".to_string(),
        })?;

        let video_info = VideoInfo::from_caps(caps).map_err(|e| CameraError::CaptureStream {
            details: format!("Failed to get video info: {}", e),
        })?;

        let map = buffer
            .map_readable()
            .map_err(|e| CameraError::CaptureStream {
                details: format!("Failed to map buffer: {}", e),
            })?;

        let width = video_info.width();
        let height = video_info.height();
        let row_bytes = width as usize * 4;
        let stride = video_info.stride()[0] as usize;
        let src = map.as_slice();

        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            if end > src.len() {
                return Err(CameraError::CaptureStream {
                    details: format!("Buffer too short for {}x{} RGBA frame", width, height),
                });
            }
            data.extend_from_slice(&src[start..end]);
        }

        Ok(FrameData::new(
            id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgba8,
        ))
    }
}

impl MediaStream for GstMediaStream {
    fn facing_mode(&self) -> FacingMode {
        self.facing
    }

    fn video_state(&mut self) -> VideoState {
        self.refresh();
        let (width, height) = self
            .latest
            .as_ref()
            .map(|frame| (frame.width, frame.height))
            .unwrap_or((0, 0));

        VideoState {
            paused: self.pipeline.current_state() != gstreamer::State::Playing,
            ended: self.stopped,
            width,
            height,
        }
    }

    fn read_frame(&mut self) -> Option<FrameData> {
        self.refresh();
        self.latest.clone()
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.latest = None;
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!("Failed to stop GStreamer pipeline: {}", e);
        }
        debug!("GStreamer {} camera track stopped", self.facing);
    }

    fn live_tracks(&self) -> usize {
        if self.stopped {
            0
        } else {
            1
        }
    }
}

impl Drop for GstMediaStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FramefitConfig;

    fn source_with(resolution: (u32, u32), fps: u32) -> GstMediaSource {
        let mut config = FramefitConfig::default().camera;
        config.resolution = resolution;
        config.fps = fps;
        GstMediaSource { config }
    }

    #[test]
    fn test_pipeline_requests_configured_caps() {
        let source = source_with((1920, 1080), 15);
        let pipeline = source.build_pipeline_string(source.device_for(FacingMode::Environment));

        assert!(pipeline.starts_with("v4l2src device=/dev/video1 ! "));
        assert!(pipeline.contains("video/x-raw,width=1920,height=1080,framerate=15/1"));
        assert!(pipeline.contains("video/x-raw,format=RGBA"));
    }

    #[test]
    fn test_abandoned_pipeline_returns_to_null() {
        gstreamer::init().unwrap();
        let pipeline = gstreamer::Pipeline::new();
        pipeline.set_state(gstreamer::State::Playing).unwrap();

        let error = abandon_pipeline(&pipeline, CameraError::NotStreaming);
        assert_eq!(error, CameraError::NotStreaming);
        assert_eq!(pipeline.current_state(), gstreamer::State::Null);
    }

    #[test]
    fn test_pipeline_maps_facing_to_device() {
        let source = source_with((640, 480), 30);
        assert!(source
            .build_pipeline_string(source.device_for(FacingMode::User))
            .contains("/dev/video0 "));
    }
}
