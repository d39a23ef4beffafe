//! Property-based tests for the stress engines.
//!
//! Run with: cargo test --test property_tests
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold across all engines.

pub mod accounting;
pub mod ranking;
