//! Integration tests for the scaffold pipeline engine

mod dry_run;
mod executor_lifecycle;
mod rollback;
mod test_utils;
