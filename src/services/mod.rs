pub mod account_service;
pub mod post_service;
pub mod profile_service;

pub use account_service::AccountService;
pub use post_service::PostService;
pub use profile_service::ProfileService;

use crate::collection::EditError;
use crate::error::CoreError;

/// Attach an operation-specific client message to a sub-collection failure.
pub(crate) fn edit_error(err: EditError, message: &str) -> CoreError {
    match err {
        EditError::AlreadyInState => CoreError::AlreadyInState(message.to_string()),
        EditError::NotInState => CoreError::NotInState(message.to_string()),
        EditError::EntryNotFound(_) => CoreError::EntryNotFound(message.to_string()),
    }
}
