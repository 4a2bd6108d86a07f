//! Translation Comprehensive Test Suite
//!
//! End-to-end scenarios through the public `xfmr` facade: registry,
//! dispatcher, in-memory partitions and callbacks working together.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Core Invariants** (fast, must pass)
//!   One callback per key, cascade dedup, value transformer round trip.
//!
//! - **Tier 2: Behavioral Scenarios** (workflow tests)
//!   Key translation, read filtering, read policy, subscriptions.
//!
//! ## Non-Goals
//!
//! This suite does NOT test:
//! - Path parsing corner cases (xfmr-core unit tests)
//! - MemDb storage semantics (xfmr-storage integration tests)
//! - Call Context builder details (xfmr-engine unit tests)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test translation_comprehensive
//!
//! # With dispatcher logs
//! cargo test --test translation_comprehensive -- --nocapture
//! ```

// Test utilities
mod test_utils;

// Tier 1: Core Invariants
mod cascade_delete_tests;
mod registry_tests;
mod value_xfmr_tests;

// Tier 2: Behavioral Scenarios
mod key_scenario_tests;
mod read_policy_tests;
mod validate_filter_tests;
