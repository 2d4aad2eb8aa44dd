use std::sync::Arc;

use packwise_catalog::{PackagingConfig, PackagingResolver};
use packwise_core::{CatalogRepository, PackagingEnrichment, PackagingService, ProductDetailSearch};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub packaging: PackagingService,
    pub search: ProductDetailSearch,
    pub enrichment: PackagingEnrichment,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(repo: Arc<dyn CatalogRepository>, config: PackagingConfig) -> Result<Self, prometheus::Error> {
        let packaging = PackagingService::new(repo.clone(), PackagingResolver::new(config));

        Ok(Self {
            search: ProductDetailSearch::new(repo),
            enrichment: PackagingEnrichment::new(packaging.clone()),
            packaging,
            metrics: Metrics::new()?,
        })
    }
}
