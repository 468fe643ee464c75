//! Property-based tests for pipeline ordering and checkpoint guarantees
