//! # tollgate-daemon
//!
//! The quote server: a Tokio TCP accept loop with a minimal HTTP/1.1
//! boundary, every request passing the proof-of-work admission gate before
//! it can reach the quote endpoint.
//!
//! The server logic lives in the library so integration tests can drive a
//! real listener in-process; the binary only wires configuration, logging
//! and shutdown around [`server::serve`].

pub mod config;
pub mod http;
pub mod server;
