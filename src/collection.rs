//! Ordered sub-collections embedded in aggregates (likes, comments,
//! experience, education).
//!
//! Lists are kept newest-first. Every edit works on an in-memory copy of the
//! aggregate; the caller persists the whole document afterwards, so a failed
//! edit leaves nothing to roll back.

use std::collections::VecDeque;

use thiserror::Error;
use uuid::Uuid;

/// An entry that carries its own identifier inside its parent list.
pub trait Entry {
    fn entry_id(&self) -> Uuid;
    fn assign_id(&mut self, id: Uuid);
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    #[error("entry already present")]
    AlreadyInState,

    #[error("entry not present")]
    NotInState,

    #[error("entry {0} not found")]
    EntryNotFound(Uuid),
}

/// Prepend `entry` under a freshly generated identifier and return it.
pub fn insert_head<E: Entry>(list: &mut VecDeque<E>, mut entry: E) -> Uuid {
    let id = fresh_id(list);
    entry.assign_id(id);
    list.push_front(entry);
    id
}

/// Prepend `entry` unless an entry with the same key already exists.
pub fn add_unique<E, K, F>(list: &mut VecDeque<E>, key_fn: F, key: &K, entry: E) -> Result<Uuid, EditError>
where
    E: Entry,
    K: PartialEq + ?Sized,
    F: Fn(&E) -> &K,
{
    if contains_key(list, &key_fn, key) {
        return Err(EditError::AlreadyInState);
    }
    Ok(insert_head(list, entry))
}

/// Remove the entry whose key matches, failing with `NotInState` if none does.
pub fn remove_by_key<E, K, F>(list: &mut VecDeque<E>, key_fn: F, key: &K) -> Result<E, EditError>
where
    K: PartialEq + ?Sized,
    F: Fn(&E) -> &K,
{
    let index = list
        .iter()
        .position(|e| key_fn(e) == key)
        .ok_or(EditError::NotInState)?;

    list.remove(index).ok_or(EditError::NotInState)
}

/// Remove exactly the entry identified by `id`. Order of the rest is kept.
pub fn remove_by_id<E: Entry>(list: &mut VecDeque<E>, id: Uuid) -> Result<E, EditError> {
    let index = find_index(list, id).ok_or(EditError::EntryNotFound(id))?;
    list.remove(index).ok_or(EditError::EntryNotFound(id))
}

pub fn find_by_id<E: Entry>(list: &VecDeque<E>, id: Uuid) -> Option<&E> {
    list.iter().find(|e| e.entry_id() == id)
}

pub fn contains_key<E, K, F>(list: &VecDeque<E>, key_fn: F, key: &K) -> bool
where
    K: PartialEq + ?Sized,
    F: Fn(&E) -> &K,
{
    list.iter().any(|e| key_fn(e) == key)
}

fn find_index<E: Entry>(list: &VecDeque<E>, id: Uuid) -> Option<usize> {
    list.iter().position(|e| e.entry_id() == id)
}

fn fresh_id<E: Entry>(list: &VecDeque<E>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if find_index(list, id).is_none() {
            return id;
        }
    }
}
