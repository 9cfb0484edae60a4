//! Runtime configuration types shared by the server and tooling.
//!
//! These represent validated values. Loading and parsing the TOML file is
//! the server crate's job.

mod admin;
mod identity;

pub use admin::{AdminConfig, hash_secret, is_hashed};
pub use identity::IdentityConfig;
