//! Integration tests for Layer 1: Facts
//!
//! Tests for fact nodes and flattened fact trees.
