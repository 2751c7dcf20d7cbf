//! Common test utilities for acceptance-harness testing.
//!
//! Provides an in-process declarative engine that reconciles configuration
//! against [`InMemorySnyk`](snyk_acctest::client::InMemorySnyk), logging
//! setup, and a few assertion helpers.

#![allow(dead_code)]

pub mod engine;
pub mod test_utils;

pub use engine::LocalEngine;
pub use test_utils::{init_logging, seeded_remote};

/// Assert that a result is an error whose message contains a substring.
#[macro_export]
macro_rules! assert_error_message_contains {
    ($result:expr, $substring:expr) => {
        match $result {
            Err(err) => assert!(
                err.to_string().contains($substring),
                "Error message '{}' does not contain '{}'",
                err.to_string(),
                $substring
            ),
            Ok(value) => panic!(
                "Expected error containing '{}', but got Ok({:?})",
                $substring, value
            ),
        }
    };
}
