//! Identifier generation settings.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_namespace() -> String {
    cybox_core::ids::DEFAULT_NAMESPACE.to_owned()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdConfig {
    /// Namespace prefix of generated ids, e.g. `example` in
    /// `example:Observable-…`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl IdConfig {
    /// The namespace must be non-empty and must not contain `:`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming `ids.namespace`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.namespace.trim().is_empty() {
            "must not be empty"
        } else if self.namespace.contains(':') {
            "must not contain ':'"
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidValue {
            field: "ids.namespace".into(),
            reason: reason.into(),
        })
    }
}
