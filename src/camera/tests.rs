use super::*;
use crate::config::SyntheticConfig;
use crate::error::CameraError;
use std::time::Duration;

#[test]
fn test_facing_mode_opposite() {
    assert_eq!(FacingMode::User.opposite(), FacingMode::Environment);
    assert_eq!(FacingMode::Environment.opposite(), FacingMode::User);
    assert_eq!(FacingMode::Environment.to_string(), "environment");
}

#[test]
fn test_video_state_readiness() {
    let mut state = VideoState {
        paused: false,
        ended: false,
        width: 640,
        height: 480,
    };
    assert!(state.is_ready());

    state.paused = true;
    assert!(!state.is_ready());

    state.paused = false;
    state.height = 0;
    assert!(!state.is_ready());
    assert!(!VideoState::default().is_ready());
}

#[tokio::test]
async fn test_synthetic_stream_lifecycle() {
    let source = SyntheticMediaSource::builder()
        .resolution((32, 24))
        .luminance(90)
        .build();

    let mut stream = source.acquire(FacingMode::User).await.unwrap();
    assert_eq!(source.live_streams(), 1);
    assert_eq!(stream.live_tracks(), 1);
    assert!(stream.video_state().is_ready());

    let frame = stream.read_frame().unwrap();
    assert_eq!((frame.width, frame.height), (32, 24));
    assert!(frame.validate_size());
    assert_eq!(frame.data[0], 90);

    stream.stop();
    stream.stop();
    assert_eq!(stream.live_tracks(), 0);
    assert_eq!(source.live_streams(), 0);
    assert!(stream.read_frame().is_none());
    assert_eq!(
        source.journal(),
        vec![MediaOp::Acquire(FacingMode::User), MediaOp::Stop(FacingMode::User)]
    );
}

#[tokio::test]
async fn test_dropping_stream_releases_track() {
    let source = SyntheticMediaSource::builder().build();
    let stream = source.acquire(FacingMode::Environment).await.unwrap();
    drop(stream);

    assert_eq!(source.live_streams(), 0);
    assert_eq!(source.journal().last(), Some(&MediaOp::Stop(FacingMode::Environment)));
}

#[tokio::test]
async fn test_synthetic_denial() {
    let source = SyntheticMediaSource::builder().deny_permission(true).build();
    let result = source.acquire(FacingMode::User).await;

    assert!(matches!(result, Err(CameraError::PermissionDenied { .. })));
    assert_eq!(source.live_streams(), 0);
    assert_eq!(source.journal(), vec![MediaOp::Denied(FacingMode::User)]);
}

#[tokio::test]
async fn test_no_cameras_available() {
    let source = SyntheticMediaSource::builder().camera_count(0).build();
    assert_eq!(source.camera_count().await.unwrap(), 0);
    assert!(matches!(
        source.acquire(FacingMode::User).await,
        Err(CameraError::NotAvailable { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_warmup_hides_dimensions() {
    let source = SyntheticMediaSource::builder()
        .warmup(Duration::from_millis(500))
        .build();
    let mut stream = source.acquire(FacingMode::User).await.unwrap();

    assert!(!stream.video_state().has_dimensions());
    assert!(stream.read_frame().is_none());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(stream.video_state().is_ready());
    assert!(stream.read_frame().is_some());
}

#[tokio::test]
async fn test_from_config() {
    let config = SyntheticConfig {
        luminance: 10,
        camera_count: 3,
        deny_permission: false,
    };
    let source = SyntheticMediaSource::from_config(&config, (8, 8));
    assert_eq!(source.camera_count().await.unwrap(), 3);

    let mut stream = source.acquire(FacingMode::User).await.unwrap();
    assert_eq!(stream.read_frame().unwrap().data[0], 10);

    source.set_luminance(200);
    assert_eq!(stream.read_frame().unwrap().data[0], 200);
}
