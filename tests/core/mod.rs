//! Core functionality tests
//!
//! Tests for the coordinate converter, log filename dates and
//! settings persistence.

pub mod coords_tests;
pub mod filename_tests;
