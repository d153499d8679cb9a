use crate::types::{
    BrandInfo, CatalogEntryView, CatalogInfoSnapshot, CollectionMaterializedView,
    CollectionSnapshot, DiscountInfo, SubCollectionSnapshot, SubCollectionView,
};

/// Builds the flattened collection document from a freshly read snapshot.
///
/// No I/O and no state: the same snapshot always yields the same view, so a
/// failed emit can simply be retried by the next change event. Sub-collection
/// and catalog order is carried over untouched, the index displays entries
/// positionally.
pub fn resolve(snapshot: &CollectionSnapshot) -> CollectionMaterializedView {
    CollectionMaterializedView {
        id: snapshot.id,
        name: snapshot.name.clone(),
        collection_type: snapshot.collection_type.clone(),
        status: snapshot.status,
        sub_collections: snapshot
            .sub_collections
            .iter()
            .map(resolve_sub_collection)
            .collect(),
    }
}

fn resolve_sub_collection(sub: &SubCollectionSnapshot) -> SubCollectionView {
    SubCollectionView {
        id: sub.id,
        name: sub.name.clone(),
        image: sub.image.clone().filter(|image| !image.is_empty()),
        catalog_info: sub.catalog_info.iter().map(resolve_catalog_entry).collect(),
    }
}

fn resolve_catalog_entry(catalog: &CatalogInfoSnapshot) -> CatalogEntryView {
    CatalogEntryView {
        id: catalog.id,
        name: catalog.name.clone(),
        base_price: catalog.base_price,
        retail_price: catalog.retail_price,
        brand_info: catalog.brand_info.as_ref().and_then(present_brand),
        discount_info: catalog.discount_info.as_ref().and_then(present_discount),
        variants: catalog.variants.clone(),
    }
}

// Older writers store zero valued structs instead of omitting the block; the
// nil id is how those show up.
fn present_brand(brand: &BrandInfo) -> Option<BrandInfo> {
    (!brand.id.is_nil()).then(|| brand.clone())
}

fn present_discount(discount: &DiscountInfo) -> Option<DiscountInfo> {
    (!discount.id.is_nil()).then(|| discount.clone())
}
