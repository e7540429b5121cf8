//! # StackQL Core
//!
//! Core types for the StackQL client: the error taxonomy, platform
//! resolution, and subprocess execution.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of the StackQL client.**
//!
//! Users should depend on the main [`stackql`](https://crates.io/crates/stackql) crate
//! instead, which provides the stable public API.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format_version;
pub mod platform;
pub mod process;

pub use error::{Error, Result};
pub use platform::{Os, PlatformDescriptor, UnpackStrategy};

/// Name of the cache directory created under the working directory
pub const CACHE_DIR_NAME: &str = ".stackql";
