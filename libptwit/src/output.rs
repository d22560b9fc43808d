//! Turning API records into printable text
//!
//! Text output renders a record through a template chosen per record kind.
//! Before rendering, the record's `created_at` is parsed into the timestamp
//! that date directives format, and a synthetic `_time_ago_` field is added.
//! JSON output prints the record untouched, one object per line.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::ConfigStore;
use crate::error::{PtwitError, Result};
use crate::template::{render, Record};

pub const FORMAT_TWEET: &str = "\t%user.name% (@%user.screen_name%)\n\t%text%\n\t%_time_ago_%\n";

pub const FORMAT_MESSAGE: &str = "\t%sender_screen_name%\n\t%text%\n\t%_time_ago_%\n";

pub const FORMAT_USER: &str = "\t%name% (@%screen_name%)
\tLocation:     %location%
\tURL:          %url%
\tFollowers:    %followers_count%
\tFollowing:    %friends_count%
\tStatus:       %statuses_count%
\tDescription:  %description%
\tJoined:       %Y%-%m%-%d% (%_time_ago_%)
";

/// Field added to every decorated record
pub const TIME_AGO_FIELD: &str = "_time_ago_";

/// Timestamp layouts the API uses for `created_at`
const CREATED_AT_FORMATS: [&str; 2] = [
    "%a %b %d %H:%M:%S %z %Y",
    // search results
    "%a, %d %b %Y %H:%M:%S %z",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Tweet,
    Message,
    User,
}

impl RecordKind {
    /// Built-in template for this kind
    pub fn default_template(&self) -> &'static str {
        match self {
            RecordKind::Tweet => FORMAT_TWEET,
            RecordKind::Message => FORMAT_MESSAGE,
            RecordKind::User => FORMAT_USER,
        }
    }

    /// Config option that overrides the built-in template
    pub fn format_option(&self) -> &'static str {
        match self {
            RecordKind::Tweet => "tweet_format",
            RecordKind::Message => "message_format",
            RecordKind::User => "user_format",
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tweet" => Ok(RecordKind::Tweet),
            "message" => Ok(RecordKind::Message),
            "user" => Ok(RecordKind::User),
            _ => Err(format!(
                "Invalid record kind: '{}'. Valid options: tweet, message, user",
                s
            )),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Tweet => write!(f, "tweet"),
            RecordKind::Message => write!(f, "message"),
            RecordKind::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Rendered through the kind's template
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid output format: '{}'. Valid options: text, json",
                s
            )),
        }
    }
}

/// Template for `kind`: account option, then global option, then built-in
pub fn template_for(store: &ConfigStore, account: Option<&str>, kind: RecordKind) -> String {
    store
        .get_layered(kind.format_option(), account)
        .unwrap_or(kind.default_template())
        .to_string()
}

/// Parse an API `created_at` value
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    CREATED_AT_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok())
        .map(|time| time.with_timezone(&Utc))
}

/// Human-readable age of `time` as seen at `now`
pub fn time_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(time);
    if diff.num_seconds() <= 0 {
        return "just now".to_string();
    }

    let days = diff.num_days();
    let seconds = diff.num_seconds() - days * 86_400;
    let years = days / 365;
    let hours = seconds / 3600;
    let minutes = seconds / 60;

    if years > 1 {
        format!("{} years ago", years)
    } else if years == 1 {
        "1 year ago".to_string()
    } else if days > 1 {
        format!("{} days ago", days)
    } else if days == 1 {
        "1 day ago".to_string()
    } else if hours > 1 {
        format!("{} hours ago", hours)
    } else if hours == 1 {
        "1 hour ago".to_string()
    } else if minutes > 1 {
        format!("{} minutes ago", minutes)
    } else if minutes == 1 {
        "1 minute ago".to_string()
    } else {
        "just now".to_string()
    }
}

/// Copy of `record` ready for rendering, plus its creation time
///
/// Fields already present in the record are never overwritten.
pub fn decorate(record: &Record, now: DateTime<Utc>) -> (Record, Option<DateTime<Utc>>) {
    let mut decorated = record.clone();
    let created_at = record
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_created_at);

    if let Some(time) = created_at {
        decorated
            .entry(TIME_AGO_FIELD)
            .or_insert_with(|| Value::String(time_ago(time, now)));
    }

    (decorated, created_at)
}

/// Format one record
pub fn format_record(
    record: &Record,
    template: &str,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(record)
            .map_err(|e| PtwitError::InvalidInput(format!("Unserializable record: {}", e))),
        OutputFormat::Text => {
            let (decorated, created_at) = decorate(record, now);
            Ok(render(template, &decorated, created_at.as_ref()))
        }
    }
}

/// Format records in the order given, one entry per record
pub fn format_records(
    records: &[Record],
    template: &str,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    records
        .iter()
        .map(|record| format_record(record, template, format, now))
        .collect()
}

/// Read records from a JSON array, a single JSON object, or JSON lines
pub fn parse_records(input: &str) -> Result<Vec<Record>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let invalid =
        |e: serde_json::Error| PtwitError::InvalidInput(format!("Invalid record JSON: {}", e));

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Object(record) => Ok(vec![record]),
            Value::Array(items) => items.into_iter().map(into_record).collect(),
            other => Err(PtwitError::InvalidInput(format!(
                "Expected a JSON object or array, found {}",
                other
            ))),
        };
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<Value>(line).map_err(invalid).and_then(into_record))
        .collect()
}

fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(PtwitError::InvalidInput(format!(
            "Expected a JSON object, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 5, 1, 12, 0, 0).unwrap()
    }

    fn tweet() -> Record {
        json!({
            "id": 728,
            "created_at": "Sun May 01 11:30:00 +0000 2016",
            "text": "hello world",
            "user": {"name": "Tao Peng", "screen_name": "ptpt"}
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_time_ago_boundaries() {
        let now = now();
        let ago = |d: Duration| time_ago(now - d, now);

        assert_eq!(ago(Duration::seconds(30)), "just now");
        assert_eq!(ago(Duration::seconds(90)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(ago(Duration::minutes(61)), "1 hour ago");
        assert_eq!(ago(Duration::hours(5)), "5 hours ago");
        assert_eq!(ago(Duration::hours(25)), "1 day ago");
        assert_eq!(ago(Duration::days(40)), "40 days ago");
        assert_eq!(ago(Duration::days(400)), "1 year ago");
        assert_eq!(ago(Duration::days(365 * 3)), "3 years ago");
        assert_eq!(time_ago(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_parse_created_at_formats() {
        let expected = Utc.with_ymd_and_hms(2016, 5, 1, 11, 30, 0).unwrap();
        assert_eq!(parse_created_at("Sun May 01 11:30:00 +0000 2016"), Some(expected));
        assert_eq!(parse_created_at("Sun, 01 May 2016 11:30:00 +0000"), Some(expected));
        assert_eq!(parse_created_at("2016-05-01T11:30:00Z"), Some(expected));
        assert_eq!(parse_created_at("yesterday"), None);
    }

    #[test]
    fn test_decorate_adds_time_ago() {
        let (decorated, created_at) = decorate(&tweet(), now());
        assert_eq!(decorated.get(TIME_AGO_FIELD), Some(&json!("30 minutes ago")));
        assert!(created_at.is_some());
    }

    #[test]
    fn test_decorate_without_created_at() {
        let record = json!({"text": "no date"}).as_object().unwrap().clone();
        let (decorated, created_at) = decorate(&record, now());
        assert_eq!(decorated, record);
        assert_eq!(created_at, None);
    }

    #[test]
    fn test_format_tweet_text() {
        let out = format_record(&tweet(), FORMAT_TWEET, OutputFormat::Text, now()).unwrap();
        assert_eq!(out, "\tTao Peng (@ptpt)\n\thello world\n\t30 minutes ago\n");
    }

    #[test]
    fn test_format_user_joined_date() {
        let user = json!({
            "name": "Tao Peng",
            "screen_name": "ptpt",
            "created_at": "Wed Mar 07 14:05:09 +0000 2012",
            "location": "",
            "followers_count": 10
        })
        .as_object()
        .unwrap()
        .clone();

        let out = format_record(&user, FORMAT_USER, OutputFormat::Text, now()).unwrap();
        assert!(out.contains("\tLocation:     \n"));
        assert!(out.contains("\tFollowers:    10\n"));
        assert!(out.contains("\tURL:          %url%\n"));
        assert!(out.contains("\tJoined:       2012-03-07 (4 years ago)\n"));
    }

    #[test]
    fn test_format_json_is_undecorated() {
        let out = format_record(&tweet(), FORMAT_TWEET, OutputFormat::Json, now()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_object().unwrap(), &tweet());
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_format_records_keeps_order() {
        let mut second = tweet();
        second.insert("text".to_string(), json!("second"));
        let out = format_records(&[tweet(), second], "%text%", OutputFormat::Text, now()).unwrap();
        assert_eq!(out, vec!["hello world", "second"]);
    }

    #[test]
    fn test_template_for_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(temp_dir.path().join("ptwit.conf"));

        assert_eq!(template_for(&store, Some("ptpt"), RecordKind::Tweet), FORMAT_TWEET);

        store.set("tweet_format", "global %text%", None);
        assert_eq!(template_for(&store, Some("ptpt"), RecordKind::Tweet), "global %text%");

        store.set("tweet_format", "mine %text%", Some("ptpt"));
        assert_eq!(template_for(&store, Some("ptpt"), RecordKind::Tweet), "mine %text%");
        assert_eq!(template_for(&store, Some("ptpt"), RecordKind::User), FORMAT_USER);
    }

    #[test]
    fn test_record_kind_from_str() {
        assert_eq!("tweet".parse::<RecordKind>().unwrap(), RecordKind::Tweet);
        assert_eq!("MESSAGE".parse::<RecordKind>().unwrap(), RecordKind::Message);
        assert_eq!("user".parse::<RecordKind>().unwrap(), RecordKind::User);
        assert!("status".parse::<RecordKind>().is_err());
        assert_eq!(RecordKind::Message.to_string(), "message");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_records_shapes() {
        assert_eq!(parse_records("").unwrap().len(), 0);
        assert_eq!(parse_records(r#"{"id": 1}"#).unwrap().len(), 1);
        assert_eq!(parse_records(r#"[{"id": 1}, {"id": 2}]"#).unwrap().len(), 2);
        assert_eq!(parse_records("{\"id\": 1}\n\n{\"id\": 2}\n").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_records_rejects_non_objects() {
        assert!(parse_records("42").is_err());
        assert!(parse_records("[1, 2]").is_err());
        assert!(parse_records("{\"id\": 1}\nnot json").is_err());
    }
}
