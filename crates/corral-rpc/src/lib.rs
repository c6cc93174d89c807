//! # corral-rpc
//!
//! Request/response transport for the Corral daemon over a Unix domain
//! socket. Each lifecycle operation maps to one [`protocol::Request`]
//! variant and one [`protocol::Response`] variant, framed as
//! newline-delimited JSON.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use server::Server;
