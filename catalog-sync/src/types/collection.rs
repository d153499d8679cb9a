use serde::{Deserialize, Serialize};

use super::{BrandInfo, DiscountInfo, EntityId, Status, VariantInfo};

/// A collection as stored, including the catalog snapshots the Collection
/// Service caches on each sub-collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub collection_type: String,
    pub status: Status,
    #[serde(default)]
    pub sub_collections: Vec<SubCollectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCollectionSnapshot {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub catalog_ids: Vec<EntityId>,
    #[serde(default)]
    pub catalog_info: Vec<CatalogInfoSnapshot>,
}

/// Cached catalog data embedded in a sub-collection. Nested blocks may be
/// missing, null, or written as zero values by older writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfoSnapshot {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub retail_price: f64,
    #[serde(default)]
    pub brand_info: Option<BrandInfo>,
    #[serde(default)]
    pub discount_info: Option<DiscountInfo>,
    #[serde(default)]
    pub variants: Option<Vec<VariantInfo>>,
}

/// The flattened collection document published on the collection output
/// topic. Sub-collection and catalog order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMaterializedView {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: String,
    pub status: Status,
    pub sub_collections: Vec<SubCollectionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCollectionView {
    pub id: EntityId,
    pub name: String,
    pub image: Option<String>,
    pub catalog_info: Vec<CatalogEntryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntryView {
    pub id: EntityId,
    pub name: String,
    pub base_price: f64,
    pub retail_price: f64,
    pub brand_info: Option<BrandInfo>,
    pub discount_info: Option<DiscountInfo>,
    pub variants: Option<Vec<VariantInfo>>,
}
