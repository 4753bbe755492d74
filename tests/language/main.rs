//! Integration tests for Layer 1: Language
//!
//! Tests for the expression pipeline, the VM, and function scripts.

mod pipeline;
mod scripts;
mod vm;
