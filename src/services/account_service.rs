use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::{Identity, TokenAuthenticator};
use crate::error::CoreError;
use crate::models::{LoginInput, PublicUser, User, Validate};
use crate::store::{AccountDeletion, Filter, Repository, ResourceStore, StoreError};

/// The caller's own account.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn ResourceStore>,
    users: Repository<User>,
}

impl AccountService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            users: Repository::new(Arc::clone(&store)),
            store,
        }
    }

    pub async fn current_user(&self, identity: &Identity) -> Result<PublicUser, CoreError> {
        Ok(self.users.get(identity.user_id).await?.public())
    }

    /// Exchange an email and password for a fresh token. Unknown emails and
    /// wrong passwords fail the same way.
    pub async fn login(&self, input: LoginInput, authenticator: &TokenAuthenticator) -> Result<String, CoreError> {
        input.validate().map_err(CoreError::Validation)?;
        let (Some(email), Some(password)) = (input.normalized_email(), input.password()) else {
            return Err(CoreError::InvalidCredentials);
        };

        let filter = Filter::FieldEq {
            field: "email",
            value: json!(email),
        };
        let user = self.users.find_one(&filter).await?.ok_or(CoreError::InvalidCredentials)?;
        let Some(hash) = user.password.clone() else {
            return Err(CoreError::InvalidCredentials);
        };

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| CoreError::Storage(StoreError::Backend(format!("password check aborted: {}", e))))?;

        match verified {
            Ok(true) => {
                info!("User {} logged in", user.id);
                Ok(authenticator.issue(user.id)?)
            }
            Ok(false) => Err(CoreError::InvalidCredentials),
            Err(e) => {
                warn!("Stored credential for user {} is unreadable: {}", user.id, e);
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    /// Delete the caller's posts, profile and user record. Any failing step
    /// fails the whole call, even if the store already committed earlier steps.
    pub async fn delete_account(&self, identity: &Identity) -> Result<AccountDeletion, CoreError> {
        match self.store.delete_account(identity.user_id).await {
            Ok(deleted) => {
                info!(
                    "Deleted account {} ({} posts, {} profiles)",
                    identity.user_id, deleted.posts, deleted.profiles
                );
                Ok(deleted)
            }
            Err(e) => {
                error!("Account deletion for {} failed: {}", identity.user_id, e);
                Err(e.into())
            }
        }
    }
}
