use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::models::User;
use crate::store::{Filter, Kind, MemoryStore, ResourceStore, StoreError};

/// Store a fresh user and return it.
pub async fn seed_user(store: &dyn ResourceStore, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = User::new(name, email, Some("opaque-hash".to_string()));
    let doc = serde_json::to_value(&user).expect("serialize user");
    store.save(Kind::User, user.id, doc).await.expect("seed user");
    user
}

/// Memory store that can be told to fail writes. Keeps the trait's default
/// (non-atomic) account deletion so partial cascades can be observed.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_saves: AtomicBool,
    fail_pings: AtomicBool,
    fail_deletes_of: Mutex<Option<Kind>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes_of(&self, kind: Option<Kind>) {
        *self.fail_deletes_of.lock().expect("lock") = kind;
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn delete_fails(&self, kind: Kind) -> Result<(), StoreError> {
        if *self.fail_deletes_of.lock().expect("lock") == Some(kind) {
            return Err(StoreError::Backend(format!("injected delete failure on {}", kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for FlakyStore {
    async fn find_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<Value>, StoreError> {
        self.inner.find_by_id(kind, id).await
    }

    async fn find_one(&self, kind: Kind, filter: &Filter) -> Result<Option<Value>, StoreError> {
        self.inner.find_one(kind, filter).await
    }

    async fn find_many(&self, kind: Kind, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.inner.find_many(kind, filter).await
    }

    async fn save(&self, kind: Kind, id: Uuid, doc: Value) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected save failure".to_string()));
        }
        self.inner.save(kind, id, doc).await
    }

    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<(), StoreError> {
        self.delete_fails(kind)?;
        self.inner.delete_by_id(kind, id).await
    }

    async fn delete_many(&self, kind: Kind, filter: &Filter) -> Result<u64, StoreError> {
        self.delete_fails(kind)?;
        self.inner.delete_many(kind, filter).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_pings.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected ping failure".to_string()));
        }
        self.inner.ping().await
    }
}
