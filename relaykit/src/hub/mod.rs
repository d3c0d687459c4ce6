//! # Broadcast Stream Hub
//!
//! Holds long-lived streaming HTTP responses open and fans text messages out
//! to all of them.
//!
//! ## Key Components
//! - [`StreamHub`]: accepts subscribers through the transport traits and
//!   tracks them in a [`SubscriberSet`]
//! - [`TextStreamHub`]: adds a queue and one distribution thread writing
//!   `<message><delimiter>` frames to every subscriber
//! - [`Publisher`]: cloneable producer handle for the queue
//!
//! ## Channel Lifecycle
//! ```text
//! on_connect ──▶ subscribed ──(write ok)*──▶ subscribed
//!                    │
//!                    └─ write failure / timeout / error / complete / shutdown ──▶ unsubscribed
//! ```

pub mod stream;
pub mod subscribers;
pub mod text;

pub use stream::{StreamHub, NO_CACHE_HEADERS};
pub use subscribers::SubscriberSet;
pub use text::{HubMetrics, Publisher, TextStreamHub};
