#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_sync::clients::{CatalogKeeper, CollectionService, JoinError};
use catalog_sync::consumer::{MessageSource, Receipt, SourceError};
use catalog_sync::emitter::{Emitter, PublishError, Publisher};
use catalog_sync::error::ProcessError;
use catalog_sync::event::Topic;
use catalog_sync::router::{CatalogRouter, CollectionRouter, Dispatcher, Processed};
use catalog_sync::types::{
    BrandInfo, CatalogInfoSnapshot, CatalogMaterializedView, CollectionSnapshot, DiscountInfo,
    DiscountType, EntityId, Status, SubCollectionSnapshot, VariantInfo,
};
use serde_json::{json, Value};

pub const CATALOG_OUTPUT: &str = "clean_catalogs";
pub const COLLECTION_OUTPUT: &str = "clean_collections";

pub fn id(n: u8) -> EntityId {
    let mut bytes = [0u8; 12];
    bytes[0] = 0x65;
    bytes[11] = n;
    EntityId::from_bytes(bytes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeeperCall {
    GetAllCatalogInfo(EntityId),
    SyncCatalog(EntityId),
    SyncCatalogs(Vec<EntityId>),
    SyncCatalogContent(EntityId),
}

#[derive(Default)]
pub struct FakeKeeper {
    views: Mutex<HashMap<EntityId, CatalogMaterializedView>>,
    calls: Mutex<Vec<KeeperCall>>,
}

impl FakeKeeper {
    pub fn insert(&self, view: CatalogMaterializedView) {
        self.views.lock().unwrap().insert(view.id, view);
    }

    pub fn calls(&self) -> Vec<KeeperCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: KeeperCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogKeeper for FakeKeeper {
    async fn get_all_catalog_info(
        &self,
        id: EntityId,
    ) -> Result<CatalogMaterializedView, JoinError> {
        self.record(KeeperCall::GetAllCatalogInfo(id));
        self.views
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(JoinError::NotFound {
                entity: "catalog",
                id,
            })
    }

    async fn sync_catalog(&self, id: EntityId) -> Result<(), JoinError> {
        self.record(KeeperCall::SyncCatalog(id));
        Ok(())
    }

    async fn sync_catalogs(&self, ids: &[EntityId]) -> Result<(), JoinError> {
        self.record(KeeperCall::SyncCatalogs(ids.to_vec()));
        Ok(())
    }

    async fn sync_catalog_content(&self, id: EntityId) -> Result<(), JoinError> {
        self.record(KeeperCall::SyncCatalogContent(id));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionCall {
    GetCollection(EntityId),
    AddCatalogInfo(EntityId),
    UpdateCatalogInfo(EntityId),
}

#[derive(Default)]
pub struct FakeCollections {
    collections: Mutex<HashMap<EntityId, CollectionSnapshot>>,
    calls: Mutex<Vec<CollectionCall>>,
    fail_side_effects: AtomicBool,
}

impl FakeCollections {
    pub fn insert(&self, snapshot: CollectionSnapshot) {
        self.collections
            .lock()
            .unwrap()
            .insert(snapshot.id, snapshot);
    }

    pub fn calls(&self) -> Vec<CollectionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &CollectionCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Makes both catalog info calls fail with a 503.
    pub fn fail_side_effects(&self) {
        self.fail_side_effects.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: CollectionCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn side_effect(&self, call: CollectionCall) -> Result<(), JoinError> {
        self.record(call);
        match self.fail_side_effects.load(Ordering::SeqCst) {
            true => Err(JoinError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: "http://collections.test/".to_string(),
            }),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl CollectionService for FakeCollections {
    async fn get_collection(&self, id: EntityId) -> Result<CollectionSnapshot, JoinError> {
        self.record(CollectionCall::GetCollection(id));
        self.collections
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(JoinError::NotFound {
                entity: "collection",
                id,
            })
    }

    async fn add_catalog_info_to_collection(&self, id: EntityId) -> Result<(), JoinError> {
        self.side_effect(CollectionCall::AddCatalogInfo(id))
    }

    async fn update_collection_catalog_info(
        &self,
        catalog_id: EntityId,
    ) -> Result<(), JoinError> {
        self.side_effect(CollectionCall::UpdateCatalogInfo(catalog_id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub topic: String,
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl Sent {
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(self.value.as_deref().expect("not a tombstone"))
            .expect("payload is json")
    }
}

#[derive(Default)]
pub struct FakePublisher {
    sent: Mutex<Vec<Sent>>,
}

impl FakePublisher {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        value: Option<&[u8]>,
    ) -> Result<(), PublishError> {
        self.sent.lock().unwrap().push(Sent {
            topic: topic.to_string(),
            key: key.to_string(),
            value: value.map(<[u8]>::to_vec),
        });
        Ok(())
    }
}

/// Routers wired to in-memory collaborators.
pub struct Harness {
    pub keeper: Arc<FakeKeeper>,
    pub collections: Arc<FakeCollections>,
    pub publisher: Arc<FakePublisher>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new() -> Self {
        let keeper = Arc::new(FakeKeeper::default());
        let collections = Arc::new(FakeCollections::default());
        let publisher = Arc::new(FakePublisher::default());
        let catalog_emitter = Emitter::new(publisher.clone(), CATALOG_OUTPUT);
        let collection_emitter = Emitter::new(publisher.clone(), COLLECTION_OUTPUT);
        let dispatcher = Arc::new(Dispatcher::new(
            CatalogRouter::new(keeper.clone(), collections.clone(), catalog_emitter),
            CollectionRouter::new(collections.clone(), collection_emitter),
        ));

        Self {
            keeper,
            collections,
            publisher,
            dispatcher,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.publisher.sent()
    }

    pub async fn handle(&self, topic: Topic, payload: &[u8]) -> Result<Processed, ProcessError> {
        self.dispatcher.dispatch(topic, Some(payload)).await
    }
}

pub struct FakeReceipt {
    acks: Arc<AtomicUsize>,
}

impl Receipt for FakeReceipt {
    fn ack(self) -> Result<(), SourceError> {
        self.acks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out queued messages, then waits forever like an idle topic.
#[derive(Default)]
pub struct FakeSource {
    queue: Mutex<VecDeque<Option<Vec<u8>>>>,
    acks: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(messages: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
        Self {
            queue: Mutex::new(messages.into_iter().collect()),
            acks: Arc::default(),
        }
    }

    pub fn acks(&self) -> Arc<AtomicUsize> {
        self.acks.clone()
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    type Receipt = FakeReceipt;

    async fn recv(&self) -> Result<(Option<Vec<u8>>, FakeReceipt), SourceError> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(payload) => Ok((
                payload,
                FakeReceipt {
                    acks: self.acks.clone(),
                },
            )),
            None => std::future::pending().await,
        }
    }
}

pub fn oid(id: EntityId) -> Value {
    json!({ "$oid": id.to_hex() })
}

pub fn change(operation: &str, subject: EntityId, document: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "operationType": operation,
        "documentKey": { "_id": oid(subject) },
        "fullDocument": document,
    }))
    .unwrap()
}

pub fn update(subject: EntityId, document: Value, updated_fields: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "operationType": "update",
        "documentKey": { "_id": oid(subject) },
        "fullDocument": document,
        "updateDescription": {
            "updatedFields": updated_fields,
            "removedFields": [],
            "truncatedArrays": [],
        },
    }))
    .unwrap()
}

pub fn delete(subject: EntityId) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "operationType": "delete",
        "documentKey": { "_id": oid(subject) },
    }))
    .unwrap()
}

pub fn catalog_doc(subject: EntityId, status: &str) -> Value {
    json!({ "_id": oid(subject), "name": "Linen shirt", "status": status })
}

pub fn catalog_view(subject: EntityId) -> CatalogMaterializedView {
    CatalogMaterializedView {
        id: subject,
        name: "Linen shirt".to_string(),
        description: "Relaxed fit".to_string(),
        brand_info: BrandInfo {
            id: id(200),
            name: "Northwind".to_string(),
            logo: None,
        },
        base_price: 1200.0,
        retail_price: 1000.0,
        status: Status::Publish,
        variants: vec![VariantInfo {
            id: id(101),
            sku: "LS-M-WHT".to_string(),
            attributes: [("size".to_string(), "M".to_string())].into(),
            is_deleted: false,
        }],
        discount_info: Some(DiscountInfo {
            id: id(150),
            discount_type: DiscountType::Percentage,
            value: 10.0,
            valid_after: None,
            valid_before: None,
        }),
        created_at: None,
        updated_at: None,
    }
}

pub fn catalog_entry(catalog: EntityId, name: &str) -> CatalogInfoSnapshot {
    CatalogInfoSnapshot {
        id: catalog,
        name: name.to_string(),
        base_price: 100.0,
        retail_price: 90.0,
        brand_info: None,
        discount_info: None,
        variants: None,
    }
}

pub fn collection_snapshot(subject: EntityId, status: Status) -> CollectionSnapshot {
    CollectionSnapshot {
        id: subject,
        name: "Summer".to_string(),
        collection_type: "curated".to_string(),
        status,
        sub_collections: vec![
            SubCollectionSnapshot {
                id: id(31),
                name: "Shirts".to_string(),
                image: Some("shirts.png".to_string()),
                catalog_ids: vec![id(2), id(1)],
                catalog_info: vec![catalog_entry(id(2), "Second"), catalog_entry(id(1), "First")],
            },
            SubCollectionSnapshot {
                id: id(32),
                name: "Shorts".to_string(),
                image: None,
                catalog_ids: vec![id(3)],
                catalog_info: vec![catalog_entry(id(3), "Third")],
            },
        ],
    }
}

pub fn collection_doc(subject: EntityId, status: &str) -> Value {
    json!({ "_id": oid(subject), "name": "Summer", "type": "curated", "status": status })
}
