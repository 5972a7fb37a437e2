//! Reflux Migration Library
//!
//! Snapshot loading and reporting for the `reflux-migrate` CLI (main.rs).

pub mod catalog_loader;
pub mod report;
