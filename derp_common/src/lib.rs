//! DERP Common Library
//!
//! This crate provides the configuration model, the shared vehicle state and
//! the component lifecycle contract for all DERP workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration resolution and descriptor merging
//! - [`state`] - Shared state store and sparse updates
//! - [`component`] - Component trait, factory type and errors
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use derp_common::prelude::*;
//! ```

#![warn(missing_docs)]

pub mod component;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod state;
