//! High-water-mark cursors for incremental commands
//!
//! Each incremental command remembers, per account, the id of the newest
//! record it has shown under the option `<command>_since_id`. The next run
//! asks the API only for records newer than that. Passing an explicit count
//! opts out for that invocation: the request carries the count and no
//! `since_id`, whatever is stored.

use tracing::{debug, warn};

use crate::client::{FetchRequest, MAX_COUNT};
use crate::config::ConfigStore;
use crate::error::Result;
use crate::template::{value_to_string, Record};

/// Option name holding the cursor of `command`
pub fn since_id_option(command: &str) -> String {
    format!("{}_since_id", command)
}

/// Build the request for one run of `command`
pub fn plan_request(
    store: &ConfigStore,
    account: Option<&str>,
    command: &str,
    count: Option<u32>,
) -> FetchRequest {
    match count {
        Some(count) => FetchRequest {
            count: Some(count),
            since_id: None,
        },
        None => FetchRequest {
            count: Some(MAX_COUNT),
            since_id: store
                .get(&since_id_option(command), account)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        },
    }
}

/// Identifier of a record, from `id` or else `id_str`
pub fn record_id(record: &Record) -> Option<String> {
    ["id", "id_str"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
        .map(value_to_string)
}

/// Store the id of the newest record as the cursor for `command` and save
///
/// `records` must be in API order (most recent first). Nothing is written
/// for an empty result. Returns whether the cursor was updated.
pub fn advance(
    store: &mut ConfigStore,
    account: Option<&str>,
    command: &str,
    records: &[Record],
) -> Result<bool> {
    let Some(newest) = records.first() else {
        debug!("No new records for {}, cursor unchanged", command);
        return Ok(false);
    };

    let Some(id) = record_id(newest) else {
        warn!("Newest {} record has no id, cursor unchanged", command);
        return Ok(false);
    };

    debug!("Advancing {} cursor to {}", command, id);
    store.set(&since_id_option(command), id, account).save()?;
    Ok(true)
}
