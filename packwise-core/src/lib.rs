pub mod repository;
pub mod packaging;
pub mod search;
pub mod enrich;

#[cfg(test)]
mod testing;

pub use repository::{CatalogRepository, RepoError, RepoResult};
pub use packaging::{PackagingRequest, PackagingService};
pub use search::{normalize_scan, ProductDetailSearch, ProductDetails, ScannedAs};
pub use enrich::PackagingEnrichment;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Catalog repository error: {0}")]
    Repository(RepoError),
}

impl From<RepoError> for CoreError {
    fn from(err: RepoError) -> Self {
        CoreError::Repository(err)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
