//! # pf-core
//!
//! Shared error and result types for the prefit workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{Error, Result};
