//! Integration test crate for the Kiln repository.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end repository flows across the workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p kiln-integration-tests
//! ```
