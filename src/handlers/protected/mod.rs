// handlers/protected/mod.rs - Handlers behind token authentication
//
// Every handler here takes an `Identity`, which only exists once
// token_auth_middleware has accepted the request.

pub mod auth;
pub mod posts;
pub mod profile;
