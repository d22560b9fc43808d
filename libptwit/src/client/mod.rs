//! Boundary to the remote API client
//!
//! ptwit does not speak HTTP itself. Anything that can verify the
//! authenticated identity and list records most-recent-first can drive the
//! commands in [`crate::commands`]. [`mock::MockClient`] is the in-process
//! implementation used by tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::template::Record;

pub mod mock;

/// Maximum page size the API accepts for list operations
pub const MAX_COUNT: u32 = 200;

/// Record lists the client can fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    HomeTimeline,
    Mentions,
    Replies,
    DirectMessages,
}

/// Paging parameters for a list operation
///
/// Built by [`crate::cursor::plan_request`]; `count` and `since_id` are never
/// both taken from the user in the same call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub count: Option<u32>,
    pub since_id: Option<String>,
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub screen_name: String,
}

/// Authenticated API client
#[async_trait]
pub trait Client: Send + Sync {
    /// Return the account the credentials belong to
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authentication` when the credentials are rejected.
    async fn verify_identity(&self) -> Result<Identity>;

    /// List records of `feed`, most recent first
    ///
    /// When `request.since_id` is set only records newer than it are returned.
    async fn fetch(&self, feed: Feed, request: &FetchRequest) -> Result<Vec<Record>>;
}
