//! Shared types for Scratch Match.
//!
//! This crate carries everything a client and the server must agree on:
//! request/response objects, WebSocket frames, the identity assertion
//! signing scheme, and admin secret verification. HTTP clients live behind
//! the `client` feature.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod objects;
pub mod signature;
