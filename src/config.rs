use crate::{
    error::{CatalogError, Result},
    kernel,
    page::MIN_PAGE_SIZE,
};

/// How a [`crate::FamilyCatalog`] lays out its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    page_size: usize,
}

impl CatalogConfig {
    /// Catalog pages of the native page size.
    pub fn from_system() -> Self {
        Self {
            page_size: kernel::system_page_size(),
        }
    }

    /// Catalog pages of `page_size` bytes. It has to be a power of two and
    /// hold at least one descriptor.
    pub fn with_page_size(page_size: usize) -> Result<Self> {
        if !page_size.is_power_of_two() || page_size < MIN_PAGE_SIZE {
            return Err(CatalogError::InvalidPageSize { page_size });
        }

        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::from_system()
    }
}
