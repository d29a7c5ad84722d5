//! Rename mapping rules.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A literal find/replace rule applied to names before they are written.
///
/// An empty `from` means "prepend `to`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenameMapping {
    /// Literal text to find. Empty for a prepend rule.
    #[serde(default)]
    pub from: String,
    /// Replacement text.
    #[serde(default)]
    pub to: String,
}

impl RenameMapping {
    /// Create a replace rule.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a prepend rule.
    pub fn prepend(prefix: impl Into<String>) -> Self {
        Self {
            from: String::new(),
            to: prefix.into(),
        }
    }

    /// Check if this rule prepends rather than replaces.
    pub fn is_prepend(&self) -> bool {
        self.from.is_empty()
    }

    /// Parse the `FROM=TO` form. `=X` is a prepend rule.
    ///
    /// Splits on the first `=`, so `TO` may itself contain `=`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        match text.split_once('=') {
            Some((from, to)) => Ok(Self::new(from, to)),
            None => Err(ConfigError::Invalid {
                message: format!("rename mapping '{text}' must have the form FROM=TO"),
            }),
        }
    }
}
