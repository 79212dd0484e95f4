//! Refresh and dialog lifecycle management for the sipkit stack
//!
//! The [`RefreshManager`](refresh::RefreshManager) keeps registrations and
//! subscriptions alive by resending their request before the granted expiry
//! runs out. It sits between a [`RequestSender`](transport::RequestSender),
//! which delivers requests and returns their final responses, and a
//! [`RefreshListener`](transport::RefreshListener), which hears the outcome
//! of every refresh.

pub mod config;
pub mod errors;
pub mod refresh;
pub mod transport;

pub use config::RefreshConfig;
pub use errors::{RefreshError, RefreshResult, TransportError};
pub use refresh::{ConnectionState, RefreshContentWriter, RefreshId, RefreshManager};
pub use transport::{RefreshListener, RequestSender};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        ConnectionState, RefreshConfig, RefreshContentWriter, RefreshError, RefreshId,
        RefreshListener, RefreshManager, RefreshResult, RequestSender, TransportError,
    };
}
