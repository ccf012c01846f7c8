//! Integration test crate for the Tollgate workspace.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise the full admission pipeline over a live listener.
//!
//! Run them with:
//! ```sh
//! cargo test -p tollgate-integration-tests
//! ```
