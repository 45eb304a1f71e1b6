//! configsync core - data types
//!
//! Pure data structures with no behavior beyond small helpers. The client
//! crate depends on this; nothing here touches the network.

use chrono::{DateTime, Utc};

pub mod entry;
pub mod error;
pub mod protocol;

pub use entry::CacheEntry;
pub use error::{FetchError, LookupError};
pub use protocol::{ClientFrame, KeyUpdate, ServerFrame, UpdateEnvelope, ValueEntry, ValueResponse};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
