use super::*;
use crate::camera::{FacingMode, MediaOp, SyntheticMediaSource};
use crate::config::FramefitConfig;
use crate::error::{CameraError, FramefitError};
use crate::lighting::LightingCategory;
use crate::session::SessionStatus;
use std::sync::Arc;

fn synthetic(luminance: u8, cameras: usize) -> SyntheticMediaSource {
    SyntheticMediaSource::builder()
        .resolution((160, 120))
        .luminance(luminance)
        .camera_count(cameras)
        .build()
}

#[tokio::test(start_paused = true)]
async fn test_run_samples_and_captures() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("selfie.jpg");
    let source = synthetic(128, 1);
    let mut app = CaptureApp::new(FramefitConfig::default(), Arc::new(source.clone())).unwrap();

    let plan = RunPlan {
        facing: FacingMode::User,
        ticks: 3,
        switch_camera: false,
        output: Some(output.clone()),
    };
    let outcome = app.run(&plan).await.unwrap();

    assert!(!outcome.interrupted);
    assert_eq!(outcome.samples.len(), 3);
    assert!(outcome
        .samples
        .iter()
        .all(|s| s.category == LightingCategory::Good));

    let image = outcome.capture.unwrap();
    assert_eq!((image.width, image.height), (160, 120));
    assert_eq!(std::fs::read(&output).unwrap(), image.jpeg_bytes());
    let uri = std::fs::read_to_string(output.with_extension("datauri")).unwrap();
    assert_eq!(uri, image.to_data_uri());

    assert_eq!(app.session().status(), SessionStatus::Closed);
    assert_eq!(source.live_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_switch() {
    let source = synthetic(20, 2);
    let mut app = CaptureApp::new(FramefitConfig::default(), Arc::new(source.clone())).unwrap();

    let plan = RunPlan {
        facing: FacingMode::User,
        ticks: 1,
        switch_camera: true,
        output: None,
    };
    let outcome = app.run(&plan).await.unwrap();

    assert!(outcome.capture.is_none());
    assert_eq!(outcome.samples[0].category, LightingCategory::TooDark);
    assert_eq!(
        source.journal(),
        vec![
            MediaOp::Acquire(FacingMode::User),
            MediaOp::Stop(FacingMode::User),
            MediaOp::Acquire(FacingMode::Environment),
            MediaOp::Stop(FacingMode::Environment),
        ]
    );
}

#[tokio::test]
async fn test_run_interrupted_by_shutdown() {
    let source = synthetic(128, 1);
    let mut app = CaptureApp::new(FramefitConfig::default(), Arc::new(source.clone())).unwrap();
    app.shutdown_token().cancel();

    let plan = RunPlan {
        facing: FacingMode::User,
        ticks: 5,
        switch_camera: false,
        output: None,
    };
    let outcome = app.run(&plan).await.unwrap();

    assert!(outcome.interrupted);
    assert!(outcome.samples.is_empty());
    assert_eq!(app.session().status(), SessionStatus::Closed);
    assert_eq!(source.live_streams(), 0);
}

#[tokio::test]
async fn test_run_reports_permission_denial() {
    let source = SyntheticMediaSource::builder().deny_permission(true).build();
    let mut app = CaptureApp::new(FramefitConfig::default(), Arc::new(source)).unwrap();

    let plan = RunPlan {
        facing: FacingMode::Environment,
        ticks: 1,
        switch_camera: false,
        output: None,
    };

    assert!(matches!(
        app.run(&plan).await,
        Err(FramefitError::Camera(CameraError::PermissionDenied { .. }))
    ));
    assert_eq!(app.session().status(), SessionStatus::Closed);
}
