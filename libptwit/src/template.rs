//! Record templates
//!
//! A template is plain text with tags between a pair of markers, `%user.name%`
//! by default. A tag body is a dotted path into the record, a single strftime
//! directive letter when a timestamp is supplied, or empty for a literal
//! marker (`%%` renders `%`). Rendering never fails: a tag that resolves to
//! nothing is written back unchanged, and so is an unterminated tag.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A record returned by the API, as a JSON object
pub type Record = serde_json::Map<String, Value>;

/// Tag bodies that format the timestamp instead of reading the record
pub const DATE_DIRECTIVES: &str = "aAbBcdHIjmMpSUwWxXyYZ";

/// Opening and closing tag markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: char,
    pub close: char,
}

impl Delimiters {
    /// `%name%`
    pub const PERCENT: Delimiters = Delimiters {
        open: '%',
        close: '%',
    };

    /// `{name}`
    pub const BRACES: Delimiters = Delimiters {
        open: '{',
        close: '}',
    };
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::PERCENT
    }
}

/// Resolve a dotted key path against a record
///
/// A key present verbatim wins over splitting, so `"web.site"` finds a
/// top-level `"web.site"` entry before trying `record["web"]["site"]`.
/// Returns `None` when nothing matches, which callers must keep distinct from
/// an empty string.
pub fn lookup<'a>(key: &str, record: &'a Record) -> Option<&'a Value> {
    if let Some(value) = record.get(key) {
        return Some(value);
    }

    let (head, rest) = key.split_once('.')?;
    match record.get(head)? {
        Value::Object(nested) => lookup(rest, nested),
        _ => None,
    }
}

/// Text form of a resolved value
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Render with percent delimiters
///
/// # Examples
///
/// ```
/// use libptwit::template::{render, Record};
/// use serde_json::json;
///
/// let record: Record = json!({"user": {"name": "pt"}}).as_object().unwrap().clone();
/// assert_eq!(render("%user.name% 100%%", &record, None), "pt 100%");
/// assert_eq!(render("%missing%", &record, None), "%missing%");
/// ```
pub fn render(template: &str, record: &Record, timestamp: Option<&DateTime<Utc>>) -> String {
    render_with(template, record, timestamp, Delimiters::PERCENT)
}

/// Render with an explicit delimiter pair
pub fn render_with(
    template: &str,
    record: &Record,
    timestamp: Option<&DateTime<Utc>>,
    delimiters: Delimiters,
) -> String {
    let mut out = String::with_capacity(template.len());
    // Byte offset just past the opening marker of the tag being read
    let mut tag_start: Option<usize> = None;

    for (i, ch) in template.char_indices() {
        match tag_start {
            None if ch == delimiters.open => tag_start = Some(i + ch.len_utf8()),
            None => out.push(ch),
            Some(start) if ch == delimiters.close => {
                expand_tag(&mut out, &template[start..i], record, timestamp, delimiters);
                tag_start = None;
            }
            Some(_) => {}
        }
    }

    if let Some(start) = tag_start {
        out.push(delimiters.open);
        out.push_str(&template[start..]);
    }

    out
}

fn expand_tag(
    out: &mut String,
    body: &str,
    record: &Record,
    timestamp: Option<&DateTime<Utc>>,
    delimiters: Delimiters,
) {
    if body.is_empty() {
        out.push(delimiters.open);
        return;
    }

    if let Some(time) = timestamp {
        if let Some(directive) = date_directive(body) {
            out.push_str(&time.format(&format!("%{}", directive)).to_string());
            return;
        }
    }

    match lookup(body, record) {
        Some(value) => out.push_str(&value_to_string(value)),
        None => {
            out.push(delimiters.open);
            out.push_str(body);
            out.push(delimiters.close);
        }
    }
}

fn date_directive(body: &str) -> Option<char> {
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if DATE_DIRECTIVES.contains(c) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("test record must be an object")
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 3, 7, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_double_marker_is_literal() {
        assert_eq!(render("%%", &Record::new(), None), "%");
        assert_eq!(render("100%% sure", &Record::new(), None), "100% sure");
    }

    #[test]
    fn test_nested_lookup() {
        let data = record(json!({"user": {"name": "pt"}}));
        assert_eq!(render("%user.name%", &data, None), "pt");
    }

    #[test]
    fn test_missing_key_is_preserved() {
        assert_eq!(render("%missing%", &Record::new(), None), "%missing%");
        let data = record(json!({"user": {"name": "pt"}}));
        assert_eq!(render("%user.email%", &data, None), "%user.email%");
    }

    #[test]
    fn test_literal_dotted_key_wins() {
        let data = record(json!({"web.site": "x.com", "web": {"site": "other.com"}}));
        assert_eq!(render("%web.site%", &data, None), "x.com");
    }

    #[test]
    fn test_two_digit_year() {
        let time = timestamp();
        assert_eq!(render("%y%", &Record::new(), Some(&time)), "12");
    }

    #[test]
    fn test_date_directives() {
        let time = timestamp();
        let out = render("%Y%-%m%-%d% %H%:%M%:%S% %a% %b% %j% %p%", &Record::new(), Some(&time));
        assert_eq!(out, "2012-03-07 14:05:09 Wed Mar 067 PM");
    }

    #[test]
    fn test_directive_letter_without_timestamp_reads_record() {
        let data = record(json!({"y": "why"}));
        assert_eq!(render("%y%", &data, None), "why");
        assert_eq!(render("%y%", &Record::new(), None), "%y%");
    }

    #[test]
    fn test_directive_wins_over_key_with_timestamp() {
        let data = record(json!({"y": "why"}));
        let time = timestamp();
        assert_eq!(render("%y%", &data, Some(&time)), "12");
    }

    #[test]
    fn test_multi_letter_body_is_not_a_directive() {
        let data = record(json!({"Ym": "field"}));
        let time = timestamp();
        assert_eq!(render("%Ym%", &data, Some(&time)), "field");
    }

    #[test]
    fn test_unterminated_tag_is_literal() {
        let data = record(json!({"text": "hi"}));
        assert_eq!(render("%text% and %trailing", &data, None), "hi and %trailing");
        assert_eq!(render("%", &data, None), "%");
    }

    #[test]
    fn test_empty_string_differs_from_missing() {
        let data = record(json!({"location": ""}));
        assert_eq!(render("[%location%]", &data, None), "[]");
        assert_eq!(render("[%url%]", &data, None), "[%url%]");
    }

    #[test]
    fn test_non_string_values() {
        let data = record(json!({
            "followers_count": 42,
            "verified": false,
            "url": null,
            "ratio": 1.5,
            "tags": ["a", "b"]
        }));
        assert_eq!(
            render("%followers_count% %verified% [%url%] %ratio% %tags%", &data, None),
            "42 false [] 1.5 [\"a\",\"b\"]"
        );
    }

    #[test]
    fn test_path_through_scalar_fails() {
        let data = record(json!({"user": "pt"}));
        assert_eq!(lookup("user.name", &data), None);
        assert_eq!(render("%user.name%", &data, None), "%user.name%");
    }

    #[test]
    fn test_deep_lookup_with_dotted_inner_key() {
        let data = record(json!({"entities": {"urls.expanded": "https://x.com", "a": {"b": 1}}}));
        assert_eq!(
            lookup("entities.urls.expanded", &data),
            Some(&json!("https://x.com"))
        );
        assert_eq!(lookup("entities.a.b", &data), Some(&json!(1)));
    }

    #[test]
    fn test_text_outside_tags_is_copied() {
        let data = record(json!({"screen_name": "ptpt"}));
        assert_eq!(
            render("\t@%screen_name%\n\tÜnïcødé ✓", &data, None),
            "\t@ptpt\n\tÜnïcødé ✓"
        );
    }

    #[test]
    fn test_brace_delimiters() {
        let data = record(json!({"user": {"screen_name": "ptpt"}}));
        let time = timestamp();
        assert_eq!(
            render_with("{user.screen_name} on {Y}", &data, Some(&time), Delimiters::BRACES),
            "ptpt on 2012"
        );
        assert_eq!(render_with("{}", &data, None, Delimiters::BRACES), "{");
        assert_eq!(render_with("{nope}", &data, None, Delimiters::BRACES), "{nope}");
        assert_eq!(render_with("a } b {open", &data, None, Delimiters::BRACES), "a } b {open");
    }
}
