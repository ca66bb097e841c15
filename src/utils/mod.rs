pub mod auth;
pub mod validation;

pub use auth::{create_token, hash_password, verify_password, verify_token};
