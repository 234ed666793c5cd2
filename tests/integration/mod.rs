//! End-to-end integration tests
//!
//! - File conversion cycles
//! - Output data integrity
