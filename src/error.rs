use thiserror::Error;

/// Result alias used by every catalog operation.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Everything that can go wrong while talking to the catalog. None of these
/// are fatal for the process; a failed registration leaves the catalog exactly
/// as it was.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("family catalog not initialized")]
    NotInitialized,

    #[error("family {name} is {size} bytes, bigger than a {page_size} byte page")]
    OversizedFamily {
        name: String,
        size: usize,
        page_size: usize,
    },

    #[error("family {name} has size 0")]
    ZeroSizedFamily { name: String },

    #[error("invalid family name: {0:?}")]
    InvalidName(String),

    #[error("family {name} is already registered")]
    AlreadyRegistered { name: String },

    #[error("failed to map {bytes} bytes from the kernel")]
    AllocationFailed { bytes: usize },

    #[error("failed to unmap {bytes} bytes")]
    ReleaseFailed { bytes: usize },

    #[error("invalid catalog page size: {page_size}")]
    InvalidPageSize { page_size: usize },

    #[error("failed to write family report: {0}")]
    Report(#[from] std::io::Error),
}
