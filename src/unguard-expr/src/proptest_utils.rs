//! Property-based tests for the node model and visitor.
