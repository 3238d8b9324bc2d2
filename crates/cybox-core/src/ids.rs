//! Identifier generation.
//!
//! Identifiers have the form `{namespace}:{prefix}-{uuid}`. The namespace is
//! process-wide and set at most once; until then it is
//! [`DEFAULT_NAMESPACE`].

use std::sync::OnceLock;

use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_NAMESPACE: &str = "example";

static NAMESPACE: OnceLock<String> = OnceLock::new();

/// Set the id namespace. Only the first call takes effect.
///
/// Returns `false` when a namespace was already installed.
pub fn init_namespace(value: impl Into<String>) -> bool {
    match NAMESPACE.set(value.into()) {
        Ok(()) => true,
        Err(rejected) => {
            if NAMESPACE.get() != Some(&rejected) {
                warn!(
                    installed = namespace(),
                    rejected = %rejected,
                    "id namespace already set; ignoring"
                );
            }
            false
        }
    }
}

/// The active id namespace.
#[must_use]
pub fn namespace() -> &'static str {
    NAMESPACE.get().map_or(DEFAULT_NAMESPACE, String::as_str)
}

/// A fresh identifier such as `example:File-2f1c…`.
#[must_use]
pub fn create_id(prefix: &str) -> String {
    format!("{}:{prefix}-{}", namespace(), Uuid::new_v4())
}
