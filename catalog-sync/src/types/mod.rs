mod catalog;
mod collection;
mod id;
mod status;

pub use catalog::{BrandInfo, CatalogMaterializedView, DiscountInfo, DiscountType, VariantInfo};
pub use collection::{
    CatalogEntryView, CatalogInfoSnapshot, CollectionMaterializedView, CollectionSnapshot,
    SubCollectionSnapshot, SubCollectionView,
};
pub use id::{EntityId, IdParseError};
pub use status::Status;
