//! ui
//!
//! Terminal output.
//!
//! # Modules
//!
//! - [`output`] - Human one-liners, JSON results, warnings and errors
//!
//! The engine never prints; everything a user sees goes through here.

pub mod output;
