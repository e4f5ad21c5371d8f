use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::Entry;
use crate::store::{Document, Kind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Author. A back-reference, the user does not own the post's lifecycle.
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    /// At most one entry per user, most recent first.
    #[serde(default)]
    pub likes: VecDeque<Like>,
    /// Newest first.
    #[serde(default)]
    pub comments: VecDeque<Comment>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl Like {
    pub fn by(user: Uuid) -> Self {
        Self { id: Uuid::nil(), user }
    }

    pub fn user_key(&self) -> &Uuid {
        &self.user
    }
}

impl Entry for Like {
    fn entry_id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl Entry for Comment {
    fn entry_id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl Post {
    pub fn new(author: Uuid, text: impl Into<String>, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: author,
            text: text.into(),
            name: name.into(),
            avatar: avatar.into(),
            likes: VecDeque::new(),
            comments: VecDeque::new(),
            date: Utc::now(),
        }
    }
}

impl Document for Post {
    const KIND: Kind = Kind::Post;

    fn id(&self) -> Uuid {
        self.id
    }
}
