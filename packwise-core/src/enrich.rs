use packwise_catalog::{ItemSnapshot, PackagingDescriptor};

use crate::packaging::PackagingService;
use crate::search::ProductDetails;

/// Post-processing stage for product-detail responses: fills the pack card
/// from the packaging resolver when it is empty. Never fails the response.
#[derive(Clone)]
pub struct PackagingEnrichment {
    service: PackagingService,
}

impl PackagingEnrichment {
    pub const NAME: &'static str = "packaging_enrichment";

    pub fn new(service: PackagingService) -> Self {
        Self { service }
    }

    /// Runs over the snapshot the details were built from, so the unit card
    /// and the pack card read the same catalog state.
    pub fn apply(&self, details: ProductDetails, snapshot: &ItemSnapshot) -> ProductDetails {
        if details.has_pack() {
            return details;
        }
        if snapshot.product.id != details.product_id {
            tracing::warn!(product_id = %details.product_id, stage = Self::NAME, "snapshot belongs to another product");
            return details;
        }

        let packaging = self.service.resolve_snapshot(snapshot);
        Self::fill(details, packaging)
    }

    fn fill(mut details: ProductDetails, packaging: PackagingDescriptor) -> ProductDetails {
        if packaging.has_packaging {
            details.package_qty = packaging.packaging_quantity_in_base_units;
            details.package_price = packaging.packaging_price;
            details.package_name = Some(packaging.packaging_unit_name);
            details.package_barcode = packaging.packaging_barcode;
        } else {
            tracing::debug!(product_id = %details.product_id, stage = Self::NAME, "no packaging to add");
        }
        details
    }
}
