//! Site-wide settings, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! default_format = "html"
//! method_override_field = "__method__"
//! template_dir = "templates"
//! ```
//!
//! Set `method_override_field = ""` to disable the method override.

use std::path::{Path, PathBuf};

use restview_dispatch::{DEFAULT_FORMAT, DEFAULT_METHOD_OVERRIDE_FIELD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load [`Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`].
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Defaults applied to every handler of a [`Site`](crate::Site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Format used when a request does not ask for one.
    pub default_format: String,
    /// Form field a `POST` may use to override its method; empty disables it.
    pub method_override_field: String,
    /// Directory templates are loaded from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: DEFAULT_FORMAT.to_string(),
            method_override_field: DEFAULT_METHOD_OVERRIDE_FIELD.to_string(),
            template_dir: None,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// A relative `template_dir` is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml_str(&content)?;

        if let (Some(dir), Some(base)) = (&settings.template_dir, path.parent()) {
            if dir.is_relative() {
                settings.template_dir = Some(base.join(dir));
            }
        }

        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// The method override field, or `None` when disabled.
    pub fn method_override(&self) -> Option<&str> {
        Some(self.method_override_field.as_str()).filter(|field| !field.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_format, "html");
        assert_eq!(settings.method_override(), Some("__method__"));
        assert_eq!(settings.template_dir, None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml_str("default_format = \"json\"").unwrap();
        assert_eq!(settings.default_format, "json");
        assert_eq!(settings.method_override(), Some("__method__"));
    }

    #[test]
    fn test_empty_override_disables() {
        let settings = Settings::from_toml_str("method_override_field = \"\"").unwrap();
        assert_eq!(settings.method_override(), None);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Settings::from_toml_str("default_format = 3").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_load_resolves_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "template_dir = \"templates\"").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.template_dir, Some(dir.path().join("templates")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }
}
