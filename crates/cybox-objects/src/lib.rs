//! # cybox-objects
//!
//! Concrete Object Properties catalogs built on the `cybox-core` field
//! framework, and the registry that knows about them.
//!
//! [`builtin_registry`] is built once per process on first use; concurrent
//! first callers block until it is ready and then share it.

use std::sync::LazyLock;

use cybox_core::{DecodeContext, RegistryError, TypeRegistry};

pub mod file;
pub mod hostname;

pub use file::{EPJumpCode, EntryPointSignature, File, FilePath, Hash, Packer};
pub use hostname::Hostname;

/// Register every catalog in this crate with `registry`.
///
/// # Errors
///
/// Returns [`RegistryError::Collision`] when the registry rejects a
/// discriminator already claimed by another type.
pub fn register_builtin(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.register::<File>()?;
    registry.register::<Hostname>()?;
    Ok(())
}

static BUILTIN: LazyLock<TypeRegistry> = LazyLock::new(|| {
    let mut registry = TypeRegistry::new();
    if let Err(error) = register_builtin(&mut registry) {
        tracing::error!(%error, "failed to register built-in payload types");
    }
    registry
});

/// Process-wide registry holding the built-in catalogs.
#[must_use]
pub fn builtin_registry() -> &'static TypeRegistry {
    &BUILTIN
}

/// Decode context over [`builtin_registry`].
#[must_use]
pub fn builtin_context() -> DecodeContext<'static> {
    DecodeContext::new(builtin_registry())
}
