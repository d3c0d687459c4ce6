//! # Streaming Transport Boundary
//!
//! The stream hub does not own any network code. It drives whatever HTTP
//! server hosts it through these traits, which cover exactly what a
//! long-lived streaming response needs:
//!
//! - capability query for asynchronous handling
//! - response header, status and buffer control
//! - an [`AsyncContext`] for the held-open response, with lifecycle
//!   listeners, writes and explicit completion
//!
//! ## Lifecycle
//!
//! ```text
//! request.start_async() ──▶ AsyncContext ──write_str/flush──▶ client
//!                                │
//!                                ├─ on_complete / on_timeout / on_error ──▶ AsyncListener
//!                                └─ complete() closes the response
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Incoming request side of a streaming exchange.
pub trait StreamRequest {
    /// Whether this connection may be held open after the handler returns.
    fn is_async_supported(&self) -> bool;

    /// Switches the exchange into asynchronous mode and returns its context.
    fn start_async(&mut self) -> io::Result<Arc<dyn AsyncContext>>;
}

/// Outgoing response side, used before the exchange goes asynchronous.
pub trait StreamResponse {
    fn set_content_type(&mut self, content_type: &str);

    fn set_character_encoding(&mut self, encoding: &str);

    fn set_status(&mut self, status: u16);

    fn set_header(&mut self, name: &str, value: &str);

    /// Commits status and headers by flushing the (possibly empty) buffer.
    fn flush_buffer(&mut self) -> io::Result<()>;

    /// Sends an error status with a short message and commits the response.
    fn send_error(&mut self, status: u16, message: &str) -> io::Result<()>;
}

/// A response held open for streaming.
pub trait AsyncContext: Send + Sync {
    /// Transport-side timeout. `Duration::ZERO` means no timeout.
    fn set_timeout(&self, timeout: Duration);

    fn add_listener(&self, listener: Arc<dyn AsyncListener>);

    fn write_str(&self, data: &str) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;

    /// Closes the response. Listeners receive `on_complete`.
    fn complete(&self);
}

/// Lifecycle callbacks for an [`AsyncContext`].
pub trait AsyncListener: Send + Sync {
    fn on_complete(&self);

    fn on_timeout(&self);

    fn on_error(&self, error: &io::Error);

    fn on_start_async(&self) {}
}
