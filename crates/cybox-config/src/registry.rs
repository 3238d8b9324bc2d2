//! Type registry settings.

use cybox_core::CollisionPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// What happens when two payload types claim one discriminator:
    /// `reject`, `replace` or `keep_existing`.
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_reject() {
        assert_eq!(RegistryConfig::default().on_collision, CollisionPolicy::Reject);
    }
}
