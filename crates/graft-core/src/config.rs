//! Copy configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mapping::RenameMapping;
use crate::node::RemoteId;

/// Default number of entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Configuration for a copy run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "ConfigError"))]
pub struct GraftConfig {
    /// Folder whose contents are offered for selection.
    pub source: RemoteId,

    /// Folder the selection is replicated into.
    pub destination: RemoteId,

    /// Rename rules, applied in order.
    #[builder(default)]
    #[serde(default)]
    pub mappings: Vec<RenameMapping>,

    /// Entries requested per listing page.
    #[builder(default = "DEFAULT_PAGE_SIZE")]
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Let the storage service name file copies when no rule changed the name.
    #[builder(default = "false")]
    #[serde(default)]
    pub keep_remote_copy_naming: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        match err.field_name() {
            "source" => ConfigError::MissingSource,
            "destination" => ConfigError::MissingDestination,
            field => ConfigError::Invalid {
                message: format!("missing field '{field}'"),
            },
        }
    }
}

impl GraftConfigBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.source {
            Some(ref source) if source.is_empty() => return Err(ConfigError::MissingSource),
            None => return Err(ConfigError::MissingSource),
            _ => {}
        }
        match self.destination {
            Some(ref destination) if destination.is_empty() => {
                return Err(ConfigError::MissingDestination);
            }
            None => return Err(ConfigError::MissingDestination),
            _ => {}
        }
        if self.page_size == Some(0) {
            return Err(ConfigError::Invalid {
                message: "page_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl GraftConfig {
    /// Create a new config builder.
    pub fn builder() -> GraftConfigBuilder {
        GraftConfigBuilder::default()
    }

    /// Create a simple config with no rename rules.
    pub fn new(source: impl Into<RemoteId>, destination: impl Into<RemoteId>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            mappings: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            keep_remote_copy_naming: false,
        }
    }

    /// Check the same rules the builder enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if self.destination.is_empty() {
            return Err(ConfigError::MissingDestination);
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                message: "page_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings read from a config file. Every field is optional so that
/// command-line flags can fill in or override whatever is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Source folder id.
    pub source: Option<RemoteId>,
    /// Destination folder id.
    pub destination: Option<RemoteId>,
    /// Rename rules.
    pub mappings: Vec<RenameMapping>,
    /// Entries per listing page.
    pub page_size: Option<u32>,
    /// See [`GraftConfig::keep_remote_copy_naming`].
    pub keep_remote_copy_naming: Option<bool>,
}

impl ConfigFile {
    /// Default location: `<config dir>/graft/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("graft")
            .join("config.toml")
    }

    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }

    /// Read a config file. A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Invalid {
                message: format!("cannot read {}: {e}", path.display()),
            }),
        }
    }

    /// Seed a builder with the values present in this file.
    pub fn into_builder(self) -> GraftConfigBuilder {
        let mut builder = GraftConfig::builder();
        if let Some(source) = self.source {
            builder.source(source);
        }
        if let Some(destination) = self.destination {
            builder.destination(destination);
        }
        builder.mappings(self.mappings);
        if let Some(page_size) = self.page_size {
            builder.page_size(page_size);
        }
        if let Some(keep) = self.keep_remote_copy_naming {
            builder.keep_remote_copy_naming(keep);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = GraftConfig::builder()
            .source("src-folder")
            .destination("dst-folder")
            .mappings(vec![RenameMapping::prepend("Copy - ")])
            .build()
            .unwrap();

        assert_eq!(config.source.as_str(), "src-folder");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.mappings.len(), 1);
        assert!(!config.keep_remote_copy_naming);
    }

    #[test]
    fn test_missing_ids() {
        let err = GraftConfig::builder().destination("d").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingSource);

        let err = GraftConfig::builder().source("s").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingDestination);

        let err = GraftConfig::builder()
            .source("")
            .destination("d")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingSource);
    }

    #[test]
    fn test_zero_page_size() {
        let err = GraftConfig::builder()
            .source("s")
            .destination("d")
            .page_size(0u32)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_file_toml() {
        let file = ConfigFile::from_toml_str(
            r#"
            source = "abc"
            page_size = 50

            [[mappings]]
            from = "2023"
            to = "2024"

            [[mappings]]
            to = "Archive - "
            "#,
        )
        .unwrap();

        assert_eq!(file.source, Some(RemoteId::new("abc")));
        assert_eq!(file.mappings.len(), 2);
        assert!(file.mappings[1].is_prepend());

        let mut builder = file.into_builder();
        builder.destination("xyz");
        let config = builder.build().unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.destination.as_str(), "xyz");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }
}
