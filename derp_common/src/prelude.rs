//! Prelude module for common re-exports.
//!
//! ```rust
//! use derp_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{resolve_config, ComponentDescriptor, ConfigError, Configuration};

// ─── State ──────────────────────────────────────────────────────────
pub use crate::state::{Field, SparseUpdate, State, StateDefaults, Value};

// ─── Components ─────────────────────────────────────────────────────
pub use crate::component::{Component, ComponentError, ComponentFactory};
