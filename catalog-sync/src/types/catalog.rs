use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, Status};

/// The fully joined catalog document, as returned by the Catalog Keeper and
/// published on the catalog output topic. Rebuilt on every resync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMaterializedView {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand_info: BrandInfo,
    pub base_price: f64,
    pub retail_price: f64,
    pub status: Status,
    pub variants: Vec<VariantInfo>,
    // Serialized as an explicit null: the indexer clears the discount when
    // the field is null, and keeps the stale one when it is missing.
    #[serde(default)]
    pub discount_info: Option<DiscountInfo>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandInfo {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub id: EntityId,
    #[serde(default)]
    pub sku: String,
    // BTreeMap so the same variant always serializes to the same bytes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountInfo {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: f64,
    #[serde(default)]
    pub valid_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_before: Option<DateTime<Utc>>,
}
