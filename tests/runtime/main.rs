//! Integration tests for Layer 2: Runtime
//!
//! Tests for sessions, scenario persistence, and expression files.

mod scenarios;
mod sessions;
