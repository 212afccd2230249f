// Document store collaborator: the only backend the schedule talks to.
// Implementations deliver the full collection on every mutation.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub type Fields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // Create a document and return the id assigned by the store
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    // Subscribe to a collection. The current set is delivered right away,
    // then again after every create or delete in that collection.
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;

    // Delete a document. Deleting an id that is not there is Ok.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

// Live feed of snapshots for one collection.
// Dropping it releases the store-side registration.
pub struct Subscription {
    collection: String,
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
    unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(
        collection: impl Into<String>,
        rx: mpsc::UnboundedReceiver<Vec<Document>>,
        unsubscribe: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            collection: collection.into(),
            rx,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    // Next snapshot, or None once the store side has gone away
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            self.rx.close();
            unsubscribe();
            tracing::debug!(collection = %self.collection, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
