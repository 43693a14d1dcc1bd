use anyhow::Result;
use clap::Parser;
use framefit::app::{install_signal_handlers, CaptureApp, RunPlan};
use framefit::camera::{FacingMode, MediaSource, SyntheticMediaSource};
use framefit::FramefitConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "framefit")]
#[command(about = "Live camera capture with lighting feedback for eyeglass fit photos")]
#[command(version)]
#[command(long_about = "Opens a camera, reports whether the lighting is too dark, too bright \
or good once per second, and captures a still photo at the camera's native resolution for \
upload to the fit analysis service.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "framefit.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Camera to open first
    #[arg(long, value_enum, help = "Camera to open: user or environment")]
    facing: Option<FacingMode>,

    /// Lighting samples to report before capturing
    #[arg(long, default_value_t = 3)]
    ticks: usize,

    /// Switch to the opposite camera after opening
    #[arg(long)]
    switch: bool,

    /// Write the captured JPEG here (and its data URI next to it)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Use the synthetic media source instead of camera hardware
    #[arg(long)]
    synthetic: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting framefit v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match FramefitConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let source = build_source(&args, &config)?;
    let plan = RunPlan {
        facing: args.facing.unwrap_or(config.camera.initial_facing),
        ticks: args.ticks,
        switch_camera: args.switch,
        output: args.output.clone(),
    };

    let mut app = CaptureApp::new(config, source)?;
    let shutdown_reason = install_signal_handlers(app.shutdown_token());

    let outcome = app.run(&plan).await.map_err(|e| {
        error!("Capture session failed: {}", e);
        e
    })?;

    if outcome.interrupted {
        if let Some(reason) = shutdown_reason.lock().await.as_ref() {
            info!("Stopped early: {:?}", reason);
        }
        println!("Interrupted after {} lighting samples", outcome.samples.len());
        return Ok(());
    }

    if let (Some(image), Some(path)) = (&outcome.capture, &plan.output) {
        println!(
            "✓ Captured {}x{} photo to {}",
            image.width,
            image.height,
            path.display()
        );
    }

    Ok(())
}

fn build_source(args: &Args, config: &FramefitConfig) -> Result<Arc<dyn MediaSource>> {
    #[cfg(all(feature = "camera", target_os = "linux"))]
    if !args.synthetic {
        let source = framefit::camera::GstMediaSource::new(config.camera.clone())?;
        return Ok(Arc::new(source));
    }

    #[cfg(not(all(feature = "camera", target_os = "linux")))]
    if !args.synthetic {
        info!("Built without camera support, using the synthetic media source");
    }

    Ok(Arc::new(SyntheticMediaSource::from_config(
        &config.synthetic,
        config.camera.resolution,
    )))
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("framefit={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Framefit Configuration File");
    println!("# Default configuration with all available options");
    println!();
    println!("{}", toml::to_string_pretty(&FramefitConfig::default())?);
    Ok(())
}
