// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]
#![allow(dead_code)]

//! Common test utilities and fixtures shared across all test targets
//!
//! # Usage
//!
//! Include this module in your test crate root:
//! ```rust,ignore
//! #[path = "../common/mod.rs"]
//! mod common;
//! use common::*;
//! ```

mod fixtures;

pub use fixtures::*;
