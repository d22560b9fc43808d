//! ptwit - a command-line client for a social-network API
//!
//! This library holds the parts of the client that are independent of the
//! network: the layered configuration store that keeps credentials and
//! per-command cursors, and the template renderer that turns records into
//! text. The API client itself sits behind the [`client::Client`] trait.

pub mod client;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod cursor;
pub mod error;
pub mod logging;
pub mod output;
pub mod template;

// Re-export commonly used types
pub use config::ConfigStore;
pub use credentials::{Authorizer, ConsumerPair, Credentials, TokenPair};
pub use error::{PtwitError, Result};
pub use output::{OutputFormat, RecordKind};
pub use template::{render, Record};
