use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountDeletion, Filter, Kind, ResourceStore, StoreError, PROFILE_EXISTS};

type Collections = HashMap<Kind, BTreeMap<Uuid, Value>>;

/// Process-local document store. One lock covers every collection, so each
/// write (including a whole account deletion) is applied atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, kind: Kind) -> usize {
        self.collections
            .read()
            .await
            .get(&kind)
            .map_or(0, BTreeMap::len)
    }
}

/// A profile may not share its `user` with a different profile.
fn profile_owner_taken(collections: &Collections, id: Uuid, doc: &Value) -> bool {
    let Some(owner) = doc.get("user") else {
        return false;
    };
    collections.get(&Kind::Profile).is_some_and(|profiles| {
        profiles
            .iter()
            .any(|(other_id, other)| *other_id != id && other.get("user") == Some(owner))
    })
}

fn remove_matching(collections: &mut Collections, kind: Kind, filter: &Filter) -> u64 {
    let Some(docs) = collections.get_mut(&kind) else {
        return 0;
    };
    let before = docs.len();
    docs.retain(|_, doc| !filter.matches(doc));
    (before - docs.len()) as u64
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&kind).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn find_one(&self, kind: Kind, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&kind)
            .and_then(|docs| docs.values().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn find_many(&self, kind: Kind, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&kind)
            .map(|docs| docs.values().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, kind: Kind, id: Uuid, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if kind == Kind::Profile && profile_owner_taken(&collections, id, &doc) {
            return Err(StoreError::Conflict(PROFILE_EXISTS.to_string()));
        }
        collections.entry(kind).or_default().insert(id, doc);
        Ok(())
    }

    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&kind)
            .and_then(|docs| docs.remove(&id))
            .map(|_| ())
            .ok_or(StoreError::NotFound { kind, id })
    }

    async fn delete_many(&self, kind: Kind, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(remove_matching(&mut collections, kind, filter))
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<AccountDeletion, StoreError> {
        let mut collections = self.collections.write().await;

        let user_exists = collections
            .get(&Kind::User)
            .is_some_and(|users| users.contains_key(&user_id));
        if !user_exists {
            return Err(StoreError::NotFound {
                kind: Kind::User,
                id: user_id,
            });
        }

        let owned = Filter::owned_by(user_id);
        let posts = remove_matching(&mut collections, Kind::Post, &owned);
        let profiles = remove_matching(&mut collections, Kind::Profile, &owned);
        if let Some(users) = collections.get_mut(&Kind::User) {
            users.remove(&user_id);
        }

        Ok(AccountDeletion { posts, profiles })
    }
}
