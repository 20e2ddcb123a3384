//! # plughost-core
//!
//! Core crate for plughost. Contains configuration schemas and the
//! unified error system shared by the plugin runtime and the host binary.
//!
//! This crate has **no** internal dependencies on other plughost crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
