//! opendata-glance - browse public gaming datasets in a hosted data warehouse.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod auth;
pub mod cli;
pub mod config;
pub mod curators;
pub mod engine;
pub mod error;
pub mod logging;
pub mod query;
pub mod render;
