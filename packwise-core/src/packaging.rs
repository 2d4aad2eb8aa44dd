use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use packwise_catalog::{ItemSnapshot, PackagingDescriptor, PackagingResolver, Product};

use crate::repository::CatalogRepository;
use crate::CoreResult;

/// Identify the item by variant or by template. The variant wins when both
/// are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRequest {
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

impl PackagingRequest {
    pub fn for_product(product_id: Uuid) -> Self {
        Self {
            product_id: Some(product_id),
            template_id: None,
        }
    }

    pub fn for_template(template_id: Uuid) -> Self {
        Self {
            product_id: None,
            template_id: Some(template_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.product_id.is_none() && self.template_id.is_none()
    }
}

/// Answers packaging requests against the catalog.
#[derive(Clone)]
pub struct PackagingService {
    repo: Arc<dyn CatalogRepository>,
    resolver: Arc<PackagingResolver>,
}

impl PackagingService {
    pub fn new(repo: Arc<dyn CatalogRepository>, resolver: PackagingResolver) -> Self {
        Self {
            repo,
            resolver: Arc::new(resolver),
        }
    }

    pub async fn resolve(&self, request: &PackagingRequest) -> CoreResult<PackagingDescriptor> {
        let product = match (request.product_id, request.template_id) {
            (None, None) => {
                tracing::debug!("packaging requested without product or template");
                return Ok(PackagingDescriptor::none());
            }
            (Some(product_id), _) => self.repo.get_product(product_id).await?,
            (None, Some(template_id)) => self.repo.first_variant_of_template(template_id).await?,
        };

        match product {
            Some(product) => self.resolve_product(&product).await,
            None => {
                tracing::debug!(?request, "no product found for packaging request");
                Ok(PackagingDescriptor::none())
            }
        }
    }

    pub async fn resolve_product(&self, product: &Product) -> CoreResult<PackagingDescriptor> {
        let Some(snapshot) = self.repo.load_snapshot(product).await? else {
            tracing::warn!(product_id = %product.id, "catalog snapshot unavailable");
            return Ok(PackagingDescriptor::none());
        };

        Ok(self.resolve_snapshot(&snapshot))
    }

    /// Resolve against a snapshot the caller already holds.
    pub fn resolve_snapshot(&self, snapshot: &ItemSnapshot) -> PackagingDescriptor {
        match self.resolver.resolve(snapshot) {
            Ok(packaging) => packaging,
            Err(e) => {
                tracing::error!(product_id = %snapshot.product.id, "packaging resolution failed: {}", e);
                PackagingDescriptor::none()
            }
        }
    }
}
