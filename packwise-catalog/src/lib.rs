pub mod rounding;
pub mod uom;
pub mod currency;
pub mod product;
pub mod association;
pub mod packaging;

pub use uom::{UnitOfMeasure, UnitTable, UomError, UomType};
pub use currency::Currency;
pub use product::{ItemSnapshot, Packaging, Product, ProductTemplate};
pub use association::{
    discover_price_associations, FieldRecord, PriceAssociation, PriceAssociationSource,
    RecordShape, Relation, RelationKind, StandaloneCollection,
};
pub use packaging::{
    pick_best, PackagingConfig, PackagingDescriptor, PackagingResolver, PackagingSource,
    ResolveError,
};
