//! Integration tests for Layer 0: Foundation
//!
//! Tests for errors and the train and world snapshots expressions observe.

mod errors;
mod snapshots;
