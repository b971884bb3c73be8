//! Integration tests for opendata-glance.

pub mod curators_test;
pub mod executor_test;
pub mod live_test;
