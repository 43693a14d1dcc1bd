use crate::camera::FacingMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FramefitConfig {
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub synthetic: SyntheticConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Device index backing the user-facing (front) camera
    #[serde(default = "default_user_device")]
    pub user_device: u32,

    /// Device index backing the environment-facing (rear) camera
    #[serde(default = "default_environment_device")]
    pub environment_device: u32,

    /// Requested capture resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Requested frames per second
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// JPEG quality used for still captures (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Facing mode requested when a session opens
    #[serde(default = "default_initial_facing")]
    pub initial_facing: FacingMode,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LightingConfig {
    /// Period between lighting samples in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Examine one of every `pixel_stride` pixels
    #[serde(default = "default_pixel_stride")]
    pub pixel_stride: usize,

    /// Average luminance strictly below this is too dark
    #[serde(default = "default_too_dark_below")]
    pub too_dark_below: f64,

    /// Average luminance strictly above this is too bright
    #[serde(default = "default_too_bright_above")]
    pub too_bright_above: f64,
}

/// Parameters for the in-process media source used without camera hardware
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SyntheticConfig {
    #[serde(default = "default_synthetic_luminance")]
    pub luminance: u8,

    #[serde(default = "default_synthetic_camera_count")]
    pub camera_count: usize,

    #[serde(default)]
    pub deny_permission: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Directory holding the session-scoped result blobs
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

impl LightingConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

impl FramefitConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("framefit.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.user_device", default_user_device())?
            .set_default("camera.environment_device", default_environment_device())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as u32)?
            .set_default("camera.initial_facing", "user")?
            .set_default(
                "lighting.sample_interval_ms",
                default_sample_interval_ms(),
            )?
            .set_default("lighting.pixel_stride", default_pixel_stride() as u64)?
            .set_default("lighting.too_dark_below", default_too_dark_below())?
            .set_default("lighting.too_bright_above", default_too_bright_above())?
            .set_default("synthetic.luminance", default_synthetic_luminance() as u32)?
            .set_default(
                "synthetic.camera_count",
                default_synthetic_camera_count() as u64,
            )?
            .set_default("synthetic.deny_permission", false)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as u64,
            )?
            .set_default("system.results_dir", default_results_dir())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with FRAMEFIT_ prefix
            .add_source(
                Environment::with_prefix("FRAMEFIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: FramefitConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.lighting.sample_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Lighting sample_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.lighting.pixel_stride == 0 {
            return Err(ConfigError::Message(
                "Lighting pixel_stride must be greater than 0".to_string(),
            ));
        }

        if self.lighting.too_dark_below > self.lighting.too_bright_above {
            return Err(ConfigError::Message(format!(
                "Lighting too_dark_below ({}) must not exceed too_bright_above ({})",
                self.lighting.too_dark_below, self.lighting.too_bright_above
            )));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for FramefitConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                user_device: default_user_device(),
                environment_device: default_environment_device(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                jpeg_quality: default_jpeg_quality(),
                initial_facing: default_initial_facing(),
            },
            lighting: LightingConfig::default(),
            synthetic: SyntheticConfig {
                luminance: default_synthetic_luminance(),
                camera_count: default_synthetic_camera_count(),
                deny_permission: false,
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                results_dir: default_results_dir(),
            },
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            pixel_stride: default_pixel_stride(),
            too_dark_below: default_too_dark_below(),
            too_bright_above: default_too_bright_above(),
        }
    }
}

// Default value functions
fn default_user_device() -> u32 {
    0
}
fn default_environment_device() -> u32 {
    1
}
fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_jpeg_quality() -> u8 {
    92
}
fn default_initial_facing() -> FacingMode {
    FacingMode::User
}

fn default_sample_interval_ms() -> u64 {
    1000
}
fn default_pixel_stride() -> usize {
    10
}
fn default_too_dark_below() -> f64 {
    70.0
}
fn default_too_bright_above() -> f64 {
    180.0
}

fn default_synthetic_luminance() -> u8 {
    128
}
fn default_synthetic_camera_count() -> usize {
    2
}

fn default_event_bus_capacity() -> usize {
    64
}
fn default_results_dir() -> String {
    "./results".to_string()
}
