//! Integration tests for dictfleet
//!
//! These tests bind real loopback sockets and build dictionary layouts and
//! SQLite indexes in temporary directories.

pub mod fixtures;

mod discovery_test;
mod fleet_test;
