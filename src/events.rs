use crate::camera::FacingMode;
use crate::error::EventBusError;
use crate::lighting::LightingCategory;
use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events emitted by a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session moved between lifecycle states
    StatusChanged {
        from: SessionStatus,
        to: SessionStatus,
        timestamp: SystemTime,
    },
    /// A sampling tick classified the ambient lighting
    LightingSampled {
        category: LightingCategory,
        average_luminance: f64,
        timestamp: SystemTime,
    },
    /// The device refused or could not provide a camera
    PermissionDenied {
        facing: FacingMode,
        reason: String,
        timestamp: SystemTime,
    },
    /// All tracks of a stream were stopped
    StreamReleased {
        facing: FacingMode,
        timestamp: SystemTime,
    },
    /// The active camera was switched to the opposite facing mode
    CameraSwitched {
        from: FacingMode,
        to: FacingMode,
        timestamp: SystemTime,
    },
    /// A still frame was captured and handed off
    FrameCaptured {
        capture_id: String,
        width: u32,
        height: u32,
        timestamp: SystemTime,
    },
}

impl SessionEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> SystemTime {
        match self {
            SessionEvent::StatusChanged { timestamp, .. } => *timestamp,
            SessionEvent::LightingSampled { timestamp, .. } => *timestamp,
            SessionEvent::PermissionDenied { timestamp, .. } => *timestamp,
            SessionEvent::StreamReleased { timestamp, .. } => *timestamp,
            SessionEvent::CameraSwitched { timestamp, .. } => *timestamp,
            SessionEvent::FrameCaptured { timestamp, .. } => *timestamp,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::StatusChanged { from, to, .. } => {
                format!("Session {:?} -> {:?}", from, to)
            }
            SessionEvent::LightingSampled {
                category,
                average_luminance,
                ..
            } => format!("Lighting {:?} (luminance {:.1})", category, average_luminance),
            SessionEvent::PermissionDenied { facing, reason, .. } => {
                format!("Camera access denied for {} camera: {}", facing, reason)
            }
            SessionEvent::StreamReleased { facing, .. } => {
                format!("Released {} camera stream", facing)
            }
            SessionEvent::CameraSwitched { from, to, .. } => {
                format!("Switched camera from {} to {}", from, to)
            }
            SessionEvent::FrameCaptured {
                capture_id,
                width,
                height,
                ..
            } => format!("Captured {} ({}x{})", capture_id, width, height),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StatusChanged { .. } => "status_changed",
            SessionEvent::LightingSampled { .. } => "lighting_sampled",
            SessionEvent::PermissionDenied { .. } => "permission_denied",
            SessionEvent::StreamReleased { .. } => "stream_released",
            SessionEvent::CameraSwitched { .. } => "camera_switched",
            SessionEvent::FrameCaptured { .. } => "frame_captured",
        }
    }
}

/// Event bus for session notifications using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter applied on receive
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers, returning how many received it.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) -> Result<usize, EventBusError> {
        match &event {
            SessionEvent::PermissionDenied { facing, reason, .. } => {
                warn!("Camera access denied for {} camera: {}", facing, reason);
            }
            SessionEvent::CameraSwitched { from, to, .. } => {
                info!("Camera switched from {} to {}", from, to);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        if self.sender.receiver_count() == 0 {
            return Ok(0);
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&SessionEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<SessionEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<SessionEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<SessionEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<SessionEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Drain every event currently queued that passes the filter
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn switched() -> SessionEvent {
        SessionEvent::CameraSwitched {
            from: FacingMode::User,
            to: FacingMode::Environment,
            timestamp: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let event_bus = EventBus::new(10);
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let event_bus = EventBus::new(10);
        assert_eq!(event_bus.publish(switched()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_event_publishing_and_receiving() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        assert_eq!(event_bus.publish(switched()).unwrap(), 1);

        let received = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .expect("Should receive event within timeout")
            .expect("Should receive valid event");

        assert_eq!(received.event_type(), "camera_switched");
        assert!(received.description().contains("environment"));
    }

    #[tokio::test]
    async fn test_event_filtering() {
        let event_bus = EventBus::new(10);
        let mut receiver =
            event_bus.subscribe_filtered(EventFilter::EventTypes(vec!["frame_captured"]), "test");

        event_bus.publish(switched()).unwrap();
        event_bus
            .publish(SessionEvent::FrameCaptured {
                capture_id: "abc".to_string(),
                width: 4,
                height: 2,
                timestamp: SystemTime::now(),
            })
            .unwrap();

        let received = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.event_type(), "frame_captured");
        assert!(receiver.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_custom_filter() {
        let filter = EventFilter::Custom(|event| {
            matches!(event, SessionEvent::PermissionDenied { .. })
        });
        assert!(!filter.matches(&switched()));
        assert!(EventFilter::All.matches(&switched()));
    }
}
