//! Document persistence. Aggregates are stored whole, as JSON documents keyed
//! by `(kind, id)`; sub-collections travel inside their parent document.

pub mod memory;
pub mod postgres;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::AppConfig;

/// Open the store the configuration asks for: Postgres (migrated on connect)
/// when a database URL is set, otherwise a fresh in-memory store.
pub async fn open(config: &AppConfig) -> Result<Arc<dyn ResourceStore>, StoreError> {
    match &config.database.url {
        Some(url) => {
            let store = PgStore::connect(url, &config.database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data will not survive restarts");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Aggregate kinds the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    User,
    Profile,
    Post,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::User => "users",
            Kind::Profile => "profiles",
            Kind::Post => "posts",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    FieldEq { field: &'static str, value: Value },
}

impl Filter {
    /// Documents whose `user` back-reference is `user_id`.
    pub fn owned_by(user_id: Uuid) -> Self {
        Filter::FieldEq {
            field: "user",
            value: json!(user_id),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::FieldEq { field, value } => doc.get(*field) == Some(value),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: Kind, id: Uuid },

    #[error("{0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Document serialization error: {0}")]
    Serialization(String),
}

/// Message for a second document where only one per owner is allowed.
pub const PROFILE_EXISTS: &str = "Profile already exists";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::Conflict(PROFILE_EXISTS.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// What an account deletion removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountDeletion {
    pub posts: u64,
    pub profiles: u64,
}

/// Persistence boundary. Writes replace whole documents; implementations are
/// expected to serialise writes per document.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn find_one(&self, kind: Kind, filter: &Filter) -> Result<Option<Value>, StoreError>;

    async fn find_many(&self, kind: Kind, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Insert or replace the document stored under `(kind, id)`.
    async fn save(&self, kind: Kind, id: Uuid, doc: Value) -> Result<(), StoreError>;

    /// Fails with `NotFound` when nothing was stored under `(kind, id)`.
    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<(), StoreError>;

    async fn delete_many(&self, kind: Kind, filter: &Filter) -> Result<u64, StoreError>;

    /// Cheap liveness check for /health.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Remove a user together with the posts and profile that reference it.
    ///
    /// This default runs the three deletes one after another and stops at the
    /// first failure, which can leave earlier deletes committed. Backends that
    /// can do better override it.
    async fn delete_account(&self, user_id: Uuid) -> Result<AccountDeletion, StoreError> {
        if self.find_by_id(Kind::User, user_id).await?.is_none() {
            return Err(StoreError::NotFound {
                kind: Kind::User,
                id: user_id,
            });
        }

        let owned = Filter::owned_by(user_id);
        let posts = self.delete_many(Kind::Post, &owned).await?;
        let profiles = self.delete_many(Kind::Profile, &owned).await?;
        self.delete_by_id(Kind::User, user_id).await?;

        Ok(AccountDeletion { posts, profiles })
    }
}

/// A typed aggregate stored as one document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const KIND: Kind;

    fn id(&self) -> Uuid;
}

/// Typed access to one aggregate kind.
pub struct Repository<D> {
    store: Arc<dyn ResourceStore>,
    _phantom: PhantomData<fn() -> D>,
}

impl<D> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<D: Document> Repository<D> {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<D>, StoreError> {
        self.store
            .find_by_id(D::KIND, id)
            .await?
            .map(decode::<D>)
            .transpose()
    }

    /// Like `find_by_id`, but absence is an error.
    pub async fn get(&self, id: Uuid) -> Result<D, StoreError> {
        self.find_by_id(id)
            .await?
            .ok_or(StoreError::NotFound { kind: D::KIND, id })
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<D>, StoreError> {
        self.store
            .find_one(D::KIND, filter)
            .await?
            .map(decode::<D>)
            .transpose()
    }

    pub async fn find_many(&self, filter: &Filter) -> Result<Vec<D>, StoreError> {
        self.store
            .find_many(D::KIND, filter)
            .await?
            .into_iter()
            .map(decode::<D>)
            .collect()
    }

    pub async fn save(&self, doc: &D) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        self.store.save(D::KIND, doc.id(), value).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete_by_id(D::KIND, id).await
    }
}

fn decode<D: DeserializeOwned>(value: Value) -> Result<D, StoreError> {
    serde_json::from_value(value).map_err(StoreError::from)
}
