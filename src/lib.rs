//! Bookkeeping for a slab style memory manager.
//!
//! Every struct type the application wants to manage is registered as a
//! *family*: a name and a fixed size in bytes. Families are recorded in a
//! [`FamilyCatalog`] whose storage is made of whole pages mapped directly from
//! the kernel, so a slab allocator built on top can later find the right pool
//! for a type without going through the global allocator.
//!
//! ```no_run
//! use memfamily::{FamilyCatalog, register_struct};
//!
//! struct Socket {
//!     fd: i32,
//!     port: u16,
//! }
//!
//! let mut catalog = FamilyCatalog::new();
//! register_struct!(catalog, Socket)?;
//!
//! assert_eq!(catalog.lookup("Socket").map(|f| f.size()), Some(8));
//! # Ok::<(), memfamily::CatalogError>(())
//! ```

mod catalog;
mod config;
mod error;
mod family;
pub mod global;
mod kernel;
mod list;
mod page;

pub use catalog::{FamilyCatalog, PageView};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use family::{FamilyDescriptor, MAX_FAMILY_NAME};
pub use kernel::{acquire, release, system_page_size};

/// Registers a type as a family using its name and `size_of`.
///
/// `register_struct!(Type)` goes to the process catalog in [`global`],
/// `register_struct!(catalog, Type)` to an explicit [`FamilyCatalog`].
#[macro_export]
macro_rules! register_struct {
    ($ty:ty) => {
        $crate::global::register_family(stringify!($ty), ::std::mem::size_of::<$ty>())
    };
    ($catalog:expr, $ty:ty) => {
        $catalog.register_family(stringify!($ty), ::std::mem::size_of::<$ty>())
    };
}
