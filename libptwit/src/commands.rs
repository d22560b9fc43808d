//! Incremental list commands
//!
//! The commands that only show what is new since their last run form a closed
//! set. Each maps to one feed of the client and one record kind for output,
//! and keeps its own cursor (see [`crate::cursor`]).

use std::str::FromStr;

use tracing::debug;

use crate::client::{Client, Feed};
use crate::config::ConfigStore;
use crate::cursor;
use crate::error::Result;
use crate::output::RecordKind;
use crate::template::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incremental {
    Timeline,
    Mentions,
    Replies,
    Messages,
}

impl Incremental {
    pub const ALL: [Incremental; 4] = [
        Incremental::Timeline,
        Incremental::Mentions,
        Incremental::Replies,
        Incremental::Messages,
    ];

    /// Command name, also the prefix of its cursor option
    pub fn name(&self) -> &'static str {
        match self {
            Incremental::Timeline => "timeline",
            Incremental::Mentions => "mentions",
            Incremental::Replies => "replies",
            Incremental::Messages => "messages",
        }
    }

    pub fn feed(&self) -> Feed {
        match self {
            Incremental::Timeline => Feed::HomeTimeline,
            Incremental::Mentions => Feed::Mentions,
            Incremental::Replies => Feed::Replies,
            Incremental::Messages => Feed::DirectMessages,
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Incremental::Messages => RecordKind::Message,
            _ => RecordKind::Tweet,
        }
    }
}

impl FromStr for Incremental {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Incremental::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown command: '{}'. Valid options: timeline, mentions, replies, messages",
                    s
                )
            })
    }
}

impl std::fmt::Display for Incremental {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Run one incremental command and advance its cursor
///
/// With `count` unset the request resumes from the stored cursor; with an
/// explicit `count` it ignores the cursor. Either way the newest returned
/// record becomes the new cursor and the store is saved. Records come back in
/// API order, most recent first.
pub async fn run_incremental(
    client: &dyn Client,
    store: &mut ConfigStore,
    account: Option<&str>,
    command: Incremental,
    count: Option<u32>,
) -> Result<Vec<Record>> {
    let request = cursor::plan_request(store, account, command.name(), count);
    debug!("Fetching {} with {:?}", command, request);

    let records = client.fetch(command.feed(), &request).await?;
    debug!("Received {} {} record(s)", records.len(), command);

    cursor::advance(store, account, command.name(), &records)?;
    Ok(records)
}
