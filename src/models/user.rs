use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::{Document, Kind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash of the password. Accounts without one cannot log in.
    #[serde(default)]
    pub password: Option<String>,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

/// What other users (and the owner) get to see of a `User`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: Option<String>) -> Self {
        let email = email.into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: gravatar_url(&email),
            email,
            password,
            date: Utc::now(),
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            date: self.date,
        }
    }
}

impl Document for User {
    const KIND: Kind = Kind::User;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Gravatar URL for an e-mail address (200px, PG rated, mystery-man fallback).
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", digest)
}
