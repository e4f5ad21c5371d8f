//! Ownership decisions for mutating requests. Pure: nothing here touches the
//! store, so a denial can never leave state behind.

use uuid::Uuid;

use crate::auth::Identity;
use crate::error::CoreError;
use crate::models::{Comment, Post, Profile};

/// A mutation the caller wants to perform, with the resource it targets.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    EditProfile(&'a Profile),
    DeletePost(&'a Post),
    LikePost(&'a Post),
    DeleteComment(&'a Comment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller is not the owner of `resource`.
    NotOwner { resource: &'static str, owner: Uuid },
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NotOwner { resource: "post", .. } => "User not authorized to delete this post",
            DenyReason::NotOwner { resource: "comment", .. } => "User not authorized to delete this comment",
            DenyReason::NotOwner { .. } => "User not authorized",
        }
    }
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => Err(CoreError::Forbidden(reason.message().to_string())),
        }
    }
}

pub fn authorize_mutation(identity: &Identity, mutation: Mutation<'_>) -> Decision {
    let decision = match mutation {
        Mutation::EditProfile(profile) => owner_only(identity, "profile", profile.user),
        Mutation::DeletePost(post) => owner_only(identity, "post", post.user),
        // Any authenticated user may like or unlike any post.
        Mutation::LikePost(_) => Decision::Allowed,
        // Scoped to the comment's author, not the post's.
        Mutation::DeleteComment(comment) => owner_only(identity, "comment", comment.user),
    };

    if let Decision::Denied(reason) = &decision {
        tracing::warn!("Denied {:?} for user {}: {:?}", kind_of(&mutation), identity.user_id, reason);
    }
    decision
}

fn owner_only(identity: &Identity, resource: &'static str, owner: Uuid) -> Decision {
    if identity.user_id == owner {
        Decision::Allowed
    } else {
        Decision::Denied(DenyReason::NotOwner { resource, owner })
    }
}

fn kind_of(mutation: &Mutation<'_>) -> &'static str {
    match mutation {
        Mutation::EditProfile(_) => "profile edit",
        Mutation::DeletePost(_) => "post delete",
        Mutation::LikePost(_) => "post like",
        Mutation::DeleteComment(_) => "comment delete",
    }
}
