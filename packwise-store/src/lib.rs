pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod memory_repo;

pub use database::DbClient;
pub use catalog_repo::PostgresCatalogRepository;
pub use memory_repo::{CatalogFixture, FixtureError, MemoryCatalogRepository};
