//! core
//!
//! Core domain types and configuration for quire.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod types;
