//! Minimal INI codec for the configuration file
//!
//! Understands `[section]` headers, `key = value` / `key: value` options,
//! `#` and `;` comment lines, and indented continuation lines. Sections and
//! options keep the order in which they first appear.

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Section {
    pub name: String,
    pub options: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Vec::new(),
        }
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(key, _)| key == option)
            .map(|(_, value)| value.as_str())
    }

    /// Insert or overwrite. Returns true if the stored value changed.
    pub fn set(&mut self, option: &str, value: String) -> bool {
        match self.options.iter_mut().find(|(key, _)| key == option) {
            Some((_, existing)) if *existing == value => false,
            Some((_, existing)) => {
                *existing = value;
                true
            }
            None => {
                self.options.push((option.to_string(), value));
                true
            }
        }
    }

    pub fn remove(&mut self, option: &str) -> bool {
        let before = self.options.len();
        self.options.retain(|(key, _)| key != option);
        self.options.len() != before
    }
}

/// Parse INI text into ordered sections.
///
/// Repeated section headers merge into the first occurrence; a repeated
/// option overwrites the earlier value in place.
pub(crate) fn parse(content: &str) -> Result<Vec<Section>, ConfigError> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<usize> = None;
    let mut last_option: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        if raw.is_empty() {
            last_option = None;
            continue;
        }

        // An indented blank line is an empty line inside a multi-line value
        if trimmed.is_empty() {
            if let (Some(section), Some(option)) = (current, last_option.as_deref()) {
                let options = &mut sections[section].options;
                if let Some((_, value)) = options.iter_mut().find(|(key, _)| key == option) {
                    value.push('\n');
                }
            }
            continue;
        }

        // Continuation of the previous value, even when it looks like a
        // comment or header
        if trimmed.len() != line.len() {
            if let (Some(section), Some(option)) = (current, last_option.as_deref()) {
                let options = &mut sections[section].options;
                if let Some((_, value)) = options.iter_mut().find(|(key, _)| key == option) {
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }
        }

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if inner.is_empty() {
                return Err(ConfigError::Parse {
                    line: line_no,
                    message: "empty section name".to_string(),
                });
            }
            let position = match sections.iter().position(|s| s.name == inner) {
                Some(position) => position,
                None => {
                    sections.push(Section::new(inner));
                    sections.len() - 1
                }
            };
            current = Some(position);
            last_option = None;
            continue;
        }

        let section = current.ok_or_else(|| ConfigError::Parse {
            line: line_no,
            message: "option outside of a section".to_string(),
        })?;

        let split = trimmed.find(['=', ':']).ok_or_else(|| ConfigError::Parse {
            line: line_no,
            message: format!("expected 'key = value', found '{}'", trimmed),
        })?;

        let key = trimmed[..split].trim();
        if key.is_empty() {
            return Err(ConfigError::Parse {
                line: line_no,
                message: "empty option name".to_string(),
            });
        }
        let value = trimmed[split + 1..].trim();

        sections[section].set(key, value.to_string());
        last_option = Some(key.to_string());
    }

    Ok(sections)
}

/// The value [`parse`] reads back after [`write`] stores `value`
///
/// Every line loses its surrounding whitespace: leading blanks are
/// indistinguishable from continuation indentation.
pub(crate) fn normalize_value(value: &str) -> String {
    value.split('\n').map(str::trim).collect::<Vec<_>>().join("\n")
}

/// Serialize sections, each followed by a blank line.
pub(crate) fn write<'a>(sections: impl IntoIterator<Item = &'a Section>) -> String {
    let mut out = String::new();
    for section in sections {
        out.push('[');
        out.push_str(&section.name);
        out.push_str("]\n");
        for (key, value) in &section.options {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(&value.replace('\n', "\n\t"));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
