//! Integration test entry point
//!
//! Declared as an explicit test target in Cargo.toml so the directory
//! compiles as one test crate.

mod scrape_tests;
