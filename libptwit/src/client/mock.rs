//! Mock client implementation for testing
//!
//! Serves canned records per feed and records every request it receives, so
//! tests can check which `since_id`/`count` a command asked for.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::client::{Client, Feed, FetchRequest, Identity};
use crate::error::{ClientError, Result};
use crate::template::Record;

/// Mock client for testing
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    screen_name: String,
    feeds: HashMap<Feed, Vec<Record>>,
    error: Option<ClientError>,
    requests: Arc<Mutex<Vec<(Feed, FetchRequest)>>>,
}

impl MockClient {
    /// Create a mock client authenticated as `screen_name`
    pub fn new(screen_name: &str) -> Self {
        Self {
            screen_name: screen_name.to_string(),
            ..Default::default()
        }
    }

    /// Serve `records` (most recent first) for `feed`
    pub fn with_feed(mut self, feed: Feed, records: Vec<Record>) -> Self {
        self.feeds.insert(feed, records);
        self
    }

    /// Fail every call with `error`
    pub fn failing(mut self, error: ClientError) -> Self {
        self.error = Some(error);
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<(Feed, FetchRequest)> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<(Feed, FetchRequest)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn record_id(record: &Record) -> Option<u64> {
    match record.get("id")? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl Client for MockClient {
    async fn verify_identity(&self) -> Result<Identity> {
        if let Some(error) = &self.error {
            return Err(error.clone().into());
        }
        Ok(Identity {
            screen_name: self.screen_name.clone(),
        })
    }

    async fn fetch(&self, feed: Feed, request: &FetchRequest) -> Result<Vec<Record>> {
        self.requests.lock().unwrap().push((feed, request.clone()));

        if let Some(error) = &self.error {
            return Err(error.clone().into());
        }

        let since = request.since_id.as_deref().and_then(|s| s.parse::<u64>().ok());
        let limit = request.count.map(|c| c as usize).unwrap_or(usize::MAX);

        let records = self
            .feeds
            .get(&feed)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| match (since, record_id(r)) {
                        (Some(since), Some(id)) => id > since,
                        _ => true,
                    })
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(records)
    }
}
