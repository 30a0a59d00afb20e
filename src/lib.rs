//! OpenTibia Status Library
//!
//! Queries a game server over the OpenTibia status protocol and keeps the
//! parsed snapshot in a time-boxed on-disk cache, so repeated callers do not
//! hit the server on every request.
//!
//! ## Modules
//!
//! - `cache` - On-disk snapshot store and freshness checks
//! - `config` - Client configuration management
//! - `error` - Error types and result definitions
//! - `net` - Target endpoints and the TCP status exchange
//! - `protocol` - Status probe and XML reply parser
//! - `status` - Status facade and typed accessors
//!
//! ## Example
//!
//! ```no_run
//! use otstatus::{Attributes, OtServ, StatusConfig};
//!
//! # async fn run() {
//! let mut server = OtServ::new("127.0.0.1", None, &StatusConfig::default());
//! server.get().await;
//! println!("{:?} players online", server.players_online());
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod status;

// Re-export commonly used types
pub use cache::CacheStore;
pub use config::StatusConfig;
pub use error::{Result, StatusError};
pub use net::Target;
pub use status::{Attributes, OtServ, QueryOutcome, QueryState, RecordSource, StatusRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
