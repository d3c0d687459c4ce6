use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::task::NamedTask;
use crate::transport::AsyncContext;

// Type aliases for common types
pub type SharedTask = Arc<dyn NamedTask>;
pub type SharedChannel = Arc<dyn AsyncContext>;

/// Identifier assigned to a subscriber channel when it joins a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP status codes the hub emits.
pub mod status {
    pub const OK: u16 = 200;
    pub const NOT_IMPLEMENTED: u16 = 501;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}
