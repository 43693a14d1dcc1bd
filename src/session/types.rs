use serde::{Deserialize, Serialize};

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Closed,
    RequestingPermission,
    PermissionDenied,
    Streaming,
}

impl SessionStatus {
    /// Whether the lifecycle allows moving directly to `next`
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Closed, RequestingPermission)
                | (RequestingPermission, Streaming)
                | (RequestingPermission, PermissionDenied)
                | (RequestingPermission, Closed)
                | (Streaming, Closed)
                | (PermissionDenied, Closed)
        )
    }
}
