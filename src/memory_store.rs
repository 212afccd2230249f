// In-process document store with live subscriptions.
// Used by tests and the demo binary; supports fault injection so callers
// can exercise the store-failure paths.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::mpsc;

use crate::store::{Document, DocumentStore, Fields, StoreError, Subscription};

const ID_LEN: usize = 20;

struct Subscriber {
    collection: String,
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    subscribers: Arc<DashMap<u64, Subscriber>>,
    next_subscriber_id: AtomicU64,
    fail_next_operations: AtomicUsize,
    read_only: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Make the next `count` operations fail with `StoreError::Unavailable`
    pub fn fail_next_operations(&self, count: usize) {
        self.fail_next_operations.store(count, Ordering::SeqCst);
    }

    // Reject creates and deletes with `StoreError::PermissionDenied`
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.value().collection == collection)
            .count()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        Self::snapshot_of(&self.collections.read(), collection)
    }

    fn snapshot_of(
        collections: &HashMap<String, BTreeMap<String, Fields>>,
        collection: &str,
    ) -> Vec<Document> {
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_faults(&self, op: &str, is_write: bool) -> Result<(), StoreError> {
        let injected = self
            .fail_next_operations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if injected {
            return Err(StoreError::Unavailable(format!("{op} failed: service unavailable")));
        }

        if is_write && self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(format!("{op} on read-only store")));
        }

        Ok(())
    }

    // Push the current collection to every live subscriber of it.
    // Called with the write lock held so snapshots arrive in mutation order.
    fn broadcast(&self, collections: &HashMap<String, BTreeMap<String, Fields>>, collection: &str) {
        let snapshot = Self::snapshot_of(collections, collection);
        let mut closed = vec![];

        for entry in self.subscribers.iter() {
            let sub = entry.value();
            if sub.collection != collection {
                continue;
            }
            if sub.tx.send(snapshot.clone()).is_err() {
                closed.push(*entry.key());
            }
        }

        for id in closed {
            self.subscribers.remove(&id);
        }
    }

    fn generate_id(existing: &BTreeMap<String, Fields>) -> String {
        loop {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(ID_LEN)
                .map(char::from)
                .collect();

            if !existing.contains_key(&id) {
                return id;
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check_faults("create", true)?;

        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        let id = Self::generate_id(docs);
        docs.insert(id.clone(), fields);

        self.broadcast(&collections, collection);
        tracing::debug!(collection, id = %id, "document created");

        Ok(id)
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        self.check_faults("subscribe", false)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let sub_id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);

        {
            // registering under the read lock keeps the initial snapshot ordered
            // before any later mutation
            let collections = self.collections.read();
            let _ = tx.send(Self::snapshot_of(&collections, collection));
            self.subscribers.insert(
                sub_id,
                Subscriber {
                    collection: collection.to_string(),
                    tx,
                },
            );
        }

        let subscribers = Arc::downgrade(&self.subscribers);
        Ok(Subscription::new(collection, rx, move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.remove(&sub_id);
            }
        }))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_faults("delete", true)?;

        let mut collections = self.collections.write();
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();

        if removed {
            self.broadcast(&collections, collection);
            tracing::debug!(collection, id, "document deleted");
        } else {
            tracing::debug!(collection, id, "delete of absent document ignored");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn fields(name: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("name".to_string(), json!(name));
        f
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = InMemoryStore::new();

        let a = assert_ok!(store.create("schedule", fields("a")).await);
        let b = assert_ok!(store.create("schedule", fields("b")).await);

        assert_ne!(a, b);
        assert_eq!(a.len(), ID_LEN);
        assert_eq!(store.len("schedule"), 2);
        assert!(store.is_empty("other"));
    }

    #[tokio::test]
    async fn test_subscription_gets_full_set_on_every_mutation() {
        let store = InMemoryStore::new();
        store.create("schedule", fields("first")).await.unwrap();

        let mut sub = store.subscribe("schedule").await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 1);

        let id = store.create("schedule", fields("second")).await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 2);

        store.delete("schedule", &id).await.unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].fields["name"], "first");
    }

    #[tokio::test]
    async fn test_other_collections_do_not_notify() {
        let store = InMemoryStore::new();
        let mut sub = store.subscribe("schedule").await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());

        store.create("elsewhere", fields("x")).await.unwrap();
        store.create("schedule", fields("y")).await.unwrap();

        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].fields["name"], "y");
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = InMemoryStore::new();
        let id = store.create("schedule", fields("a")).await.unwrap();

        assert_ok!(store.delete("schedule", &id).await);
        assert_ok!(store.delete("schedule", &id).await);
        assert_ok!(store.delete("schedule", "never-existed").await);
        assert_ok!(store.delete("missing-collection", "x").await);
        assert!(store.is_empty("schedule"));
    }

    #[tokio::test]
    async fn test_dropping_subscription_unregisters() {
        let store = InMemoryStore::new();
        let sub = store.subscribe("schedule").await.unwrap();
        let other = store.subscribe("schedule").await.unwrap();
        assert_eq!(store.subscriber_count("schedule"), 2);

        drop(sub);
        assert_eq!(store.subscriber_count("schedule"), 1);

        other.unsubscribe();
        assert_eq!(store.subscriber_count("schedule"), 0);

        // mutations after everyone left are fine
        assert_ok!(store.create("schedule", fields("late")).await);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryStore::new();
        store.fail_next_operations(2);

        let err = assert_err!(store.create("schedule", fields("a")).await);
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.subscribe("schedule").await.is_err());
        assert_ok!(store.create("schedule", fields("b")).await);

        store.set_read_only(true);
        let err = assert_err!(store.delete("schedule", "x").await);
        assert!(matches!(err, StoreError::PermissionDenied(_)));
        // reads still work on a read-only store
        assert_ok!(store.subscribe("schedule").await);
    }
}
