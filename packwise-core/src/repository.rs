use async_trait::async_trait;
use uuid::Uuid;
use packwise_catalog::{ItemSnapshot, Packaging, Product, ProductTemplate};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>>;

    /// First variant of a template, by creation order.
    async fn first_variant_of_template(&self, template_id: Uuid) -> RepoResult<Option<Product>>;

    /// Variant whose barcode or internal reference equals `code`.
    async fn find_product_by_code(&self, code: &str) -> RepoResult<Option<Product>>;

    /// Template whose barcode or internal reference equals `code`.
    async fn find_template_by_code(&self, code: &str) -> RepoResult<Option<ProductTemplate>>;

    async fn find_packaging_by_barcode(&self, barcode: &str) -> RepoResult<Option<Packaging>>;

    /// Everything the packaging resolver needs for `product`, read from one
    /// consistent view. `None` when the product's template is gone.
    async fn load_snapshot(&self, product: &Product) -> RepoResult<Option<ItemSnapshot>>;
}
