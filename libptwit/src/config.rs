//! Persistent layered configuration for ptwit
//!
//! All state lives in one INI file. The `general` section holds global
//! settings (and the current account); every other section is an account
//! scope. Lookups name a scope explicitly; callers that want account-then-global
//! fallback ask for both (see [`ConfigStore::get_layered`]).
//!
//! Writes are buffered in memory and only reach disk through one of the save
//! methods, which skip the write when nothing changed.

mod ini;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use ini::Section;

/// Name of the reserved global section
pub const GENERAL_SCOPE: &str = "general";

/// Option in the general scope naming the default account
pub const CURRENT_ACCOUNT: &str = "current_account";

/// Key-value store backed by an INI file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    sections: Vec<Section>,
    dirty: bool,
}

fn section_name(scope: Option<&str>) -> &str {
    match scope {
        Some(name) if !name.is_empty() => name,
        _ => GENERAL_SCOPE,
    }
}

impl ConfigStore {
    /// Open the store at the default location
    ///
    /// See [`resolve_config_path`] for how the location is chosen.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path()?;
        Ok(Self::open(path))
    }

    /// Open the store backed by `path`
    ///
    /// A missing file yields an empty store; the file is created on the first
    /// save. An unreadable or malformed file is logged and also treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sections = match std::fs::read_to_string(&path) {
            Ok(content) => match ini::parse(&content) {
                Ok(sections) => sections,
                Err(e) => {
                    warn!("Ignoring malformed config file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                Vec::new()
            }
        };

        debug!(
            "Loaded {} config section(s) from {}",
            sections.len(),
            path.display()
        );

        Self {
            path,
            sections,
            dirty: false,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn section(&self, scope: Option<&str>) -> Option<&Section> {
        let name = section_name(scope);
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_index(&self, scope: Option<&str>) -> Option<usize> {
        let name = section_name(scope);
        self.sections.iter().position(|s| s.name == name)
    }

    /// Look up `option` in `scope`, or in the general scope when `scope` is
    /// `None` or empty
    pub fn get(&self, option: &str, scope: Option<&str>) -> Option<&str> {
        self.section(scope).and_then(|s| s.get(option))
    }

    /// Like [`get`](Self::get) but returns `default` when the option is absent
    pub fn get_or<'a>(&'a self, option: &str, scope: Option<&str>, default: &'a str) -> &'a str {
        self.get(option, scope).unwrap_or(default)
    }

    /// Look up `option` in the account scope, falling back to the general scope
    pub fn get_layered(&self, option: &str, account: Option<&str>) -> Option<&str> {
        self.get(option, account).or_else(|| self.get(option, None))
    }

    /// Set `option` in `scope`, creating the scope if needed
    ///
    /// Each line of `value` is stored trimmed, which is how the file reads it
    /// back. Writing the value already stored leaves the store clean. Names
    /// from user input should pass [`validate_option_name`] and
    /// [`validate_account_name`] first.
    pub fn set(
        &mut self,
        option: &str,
        value: impl Into<String>,
        scope: Option<&str>,
    ) -> &mut Self {
        let index = match self.section_index(scope) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(section_name(scope)));
                self.sections.len() - 1
            }
        };

        let value: String = value.into();
        let value = ini::normalize_value(&value);
        if self.sections[index].set(option, value) {
            self.dirty = true;
        }
        self
    }

    /// Remove `option` from `scope`; a scope left empty is dropped
    pub fn unset(&mut self, option: &str, scope: Option<&str>) -> &mut Self {
        if let Some(index) = self.section_index(scope) {
            if self.sections[index].remove(option) {
                self.dirty = true;
            }
            if self.sections[index].options.is_empty() {
                self.sections.remove(index);
                self.dirty = true;
            }
        }
        self
    }

    /// Drop an entire scope; an empty name means the general scope
    pub fn remove_scope(&mut self, scope: &str) -> &mut Self {
        if let Some(index) = self.section_index(Some(scope)) {
            self.sections.remove(index);
            self.dirty = true;
        }
        self
    }

    /// Whether `scope` currently holds any option
    pub fn has_scope(&self, scope: &str) -> bool {
        self.section(Some(scope)).is_some()
    }

    /// Account scopes in file order (the general scope is excluded)
    pub fn list_scopes(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.name != GENERAL_SCOPE)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// All options of `scope` in stored order
    pub fn options(&self, scope: Option<&str>) -> Vec<(&str, &str)> {
        self.section(scope)
            .map(|s| {
                s.options
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Account named by `current_account` in the general scope
    pub fn current_account(&self) -> Option<&str> {
        self.get(CURRENT_ACCOUNT, None).filter(|name| !name.is_empty())
    }

    /// Write to the backing file if there are unsaved changes
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            debug!("Config unchanged, skipping save");
            return Ok(());
        }
        self.save_forced()
    }

    /// Write to the backing file regardless of the dirty flag
    pub fn save_forced(&mut self) -> Result<()> {
        let path = self.path.clone();
        self.write_to(&path)?;
        self.dirty = false;
        Ok(())
    }

    /// Write to another file; the backing file and dirty flag are untouched
    /// unless `path` is the backing file
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        if path == self.path {
            self.dirty = false;
        }
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let general = self.sections.iter().filter(|s| s.name == GENERAL_SCOPE);
        let accounts = self.sections.iter().filter(|s| s.name != GENERAL_SCOPE);
        let content = ini::write(general.chain(accounts));

        std::fs::write(path, content).map_err(io_error)?;

        // Holds access tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(io_error)?;
        }

        debug!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Validate an account name before it becomes a section header
///
/// Rules:
/// - Cannot be empty or surrounded by whitespace
/// - Maximum 64 characters
/// - No brackets, `=`, `:` or control characters
/// - Cannot be the reserved `general` name
pub fn validate_account_name(name: &str) -> Result<()> {
    if name.is_empty() || name.trim() != name {
        return Err(ConfigError::InvalidAccountName(format!(
            "'{}' is empty or has surrounding whitespace",
            name
        ))
        .into());
    }

    if name.chars().count() > 64 {
        return Err(ConfigError::InvalidAccountName(format!(
            "'{}' is longer than 64 characters",
            name
        ))
        .into());
    }

    if name
        .chars()
        .any(|c| c.is_control() || matches!(c, '[' | ']' | '=' | ':'))
    {
        return Err(ConfigError::InvalidAccountName(format!(
            "'{}' contains a reserved character",
            name
        ))
        .into());
    }

    if name == GENERAL_SCOPE {
        return Err(ConfigError::ReservedName(name.to_string()).into());
    }

    Ok(())
}

/// Validate an option name before it is written to a section
///
/// Rules:
/// - Cannot be empty or surrounded by whitespace
/// - No `=`, `:` or control characters
/// - Cannot start with `#`, `;` or `[`
pub fn validate_option_name(name: &str) -> Result<()> {
    if name.is_empty() || name.trim() != name {
        return Err(ConfigError::InvalidOptionName(format!(
            "'{}' is empty or has surrounding whitespace",
            name
        ))
        .into());
    }

    if name
        .chars()
        .any(|c| c.is_control() || matches!(c, '=' | ':'))
    {
        return Err(ConfigError::InvalidOptionName(format!(
            "'{}' contains a reserved character",
            name
        ))
        .into());
    }

    if name.starts_with(['#', ';', '[']) {
        return Err(ConfigError::InvalidOptionName(format!(
            "'{}' starts with a comment or section marker",
            name
        ))
        .into());
    }

    Ok(())
}

/// Resolve the configuration file path
///
/// `PTWIT_CONFIG` wins when set (with `~` expanded); otherwise the file lives
/// in the platform config directory as `ptwit/ptwit.conf`.
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PTWIT_CONFIG") {
        if !path.is_empty() {
            return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
        }
    }

    let config_dir = dirs::config_dir().ok_or(ConfigError::MissingConfigDir)?;

    Ok(config_dir.join("ptwit").join("ptwit.conf"))
}
