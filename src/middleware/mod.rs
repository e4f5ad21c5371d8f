pub mod auth;

pub use auth::{token_auth_middleware, token_from_headers};
