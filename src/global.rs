//! Process-wide catalog.
//!
//! A single [`FamilyCatalog`] behind one lock, for code that wants to
//! register families from anywhere without passing a handle around. Every
//! function here fails with [`CatalogError::NotInitialized`] until [`init`]
//! has been called.

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    catalog::FamilyCatalog,
    config::CatalogConfig,
    error::{CatalogError, Result},
    family::FamilyDescriptor,
};

/// The lock is held for the whole of every operation, traversals included.
static CATALOG: Mutex<Option<FamilyCatalog>> = Mutex::new(None);

/// Initializes the process catalog with the native page size.
/// Calling it again keeps the existing catalog.
pub fn init() -> Result<()> {
    init_with(CatalogConfig::from_system())
}

/// Same as [`init`] with an explicit configuration.
pub fn init_with(config: CatalogConfig) -> Result<()> {
    let mut catalog = CATALOG.lock();

    if catalog.is_some() {
        debug!("process family catalog already initialized");
        return Ok(());
    }

    *catalog = Some(FamilyCatalog::with_config(config));
    Ok(())
}

/// Runs `f` on the process catalog while holding its lock.
pub fn with_catalog<T>(f: impl FnOnce(&mut FamilyCatalog) -> T) -> Result<T> {
    let mut catalog = CATALOG.lock();
    let catalog = catalog.as_mut().ok_or(CatalogError::NotInitialized)?;

    Ok(f(catalog))
}

/// See [`FamilyCatalog::register_family`].
pub fn register_family(name: &str, size: usize) -> Result<()> {
    with_catalog(|catalog| catalog.register_family(name, size))?
}

/// See [`FamilyCatalog::lookup`]. The descriptor is copied out since the
/// lock is released on return.
pub fn lookup(name: &str) -> Result<Option<FamilyDescriptor>> {
    with_catalog(|catalog| catalog.lookup(name).copied())
}

/// See [`FamilyCatalog::print_registered_families`].
pub fn print_registered_families() -> Result<()> {
    with_catalog(|catalog| catalog.print_registered_families())?
}

/// Drops the process catalog so tests can start from scratch. Its pages are
/// leaked like every other catalog page.
#[cfg(test)]
pub(crate) fn reset() {
    *CATALOG.lock() = None;
}
