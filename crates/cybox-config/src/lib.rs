//! # cybox-config
//!
//! Layered configuration loading using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CYBOX_*` prefix, `__` as separator)
//! 2. Project-level `.cybox/config.toml`
//! 3. User-level `~/.config/cybox/config.toml`
//! 4. Built-in defaults
//!
//! `CYBOX_IDS__NAMESPACE` maps to `ids.namespace`,
//! `CYBOX_REGISTRY__ON_COLLISION` to `registry.on_collision`.
//!
//! # Usage
//!
//! ```no_run
//! use cybox_config::CyboxConfig;
//!
//! let config = CyboxConfig::load().expect("config");
//! config.install_id_namespace();
//! let mut registry = config.registry();
//! // register payload types, then decode with it
//! # let _ = &mut registry;
//! ```

mod error;
mod ids;
mod registry;

pub use error::ConfigError;
pub use ids::IdConfig;
pub use registry::RegistryConfig;

use std::path::PathBuf;

use cybox_core::TypeRegistry;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CyboxConfig {
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl CyboxConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does not read `.env`; use [`Self::load_with_dotenv`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed and
    /// [`ConfigError::InvalidValue`] when a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the workspace root.
    ///
    /// # Errors
    ///
    /// As [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a configuration from `figment`.
    ///
    /// # Errors
    ///
    /// As [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.ids.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".cybox/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("CYBOX_").split("__"))
    }

    /// An empty type registry using the configured collision policy.
    #[must_use]
    pub fn registry(&self) -> TypeRegistry {
        TypeRegistry::with_policy(self.registry.on_collision)
    }

    /// Install the configured id namespace process-wide.
    ///
    /// Returns `false` when a namespace was already installed.
    pub fn install_id_namespace(&self) -> bool {
        let installed = cybox_core::ids::init_namespace(self.ids.namespace.clone());
        if installed {
            tracing::debug!(namespace = %self.ids.namespace, "installed id namespace");
        }
        installed
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cybox").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` (if set) looking for `.env`, then
    /// falls back to the current directory. Missing files are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use cybox_core::CollisionPolicy;

    use super::*;

    #[test]
    fn default_config_loads() {
        let config = CyboxConfig::default();
        assert_eq!(config.ids.namespace, "example");
        assert_eq!(config.registry.on_collision, CollisionPolicy::Reject);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config = CyboxConfig::from_figment(&CyboxConfig::figment()).map_err(|e| e.to_string())?;
            assert_eq!(config.ids.namespace, "example");
            assert!(config.registry().is_empty());
            Ok(())
        });
    }
}
