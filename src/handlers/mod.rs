// handlers/mod.rs - HTTP handlers, split by access tier
//
// public:    no token required (root, health, login, profile reads)
// protected: token required; routes sit behind token_auth_middleware

pub mod extract;
pub mod protected;
pub mod public;

pub use extract::{parse_id, JsonBody};
