//! # DERP Vehicle Library
//!
//! Component registry, built-in components and the vehicle cycle loop.
//! Components implement the `Component` trait defined in
//! `derp_common::component`.
//!
//! # Module Structure
//!
//! - [`core`] - VehicleCore struct, cycle loop management
//! - [`component_registry`] - Component factory registration and loading
//! - [`components`] - Component implementations
//! - [`device`] - Input device discovery and event reading
//! - [`record`] - Record folder creation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    derp_vehicle (single crate)                   │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │   State     │◄──►│ VehicleCore  │◄───│ Component Registry  │  │
//! │  │(derp_common)│    │ (cycle loop) │    │                     │  │
//! │  └─────────────┘    └──────┬───────┘    └─────────────────────┘  │
//! │                            │                                     │
//! │                            ▼                                     │
//! │                   ┌────────────────┐      ┌──────────────────┐   │
//! │                   │  Component     │◄─────│  InputDevice     │   │
//! │                   │  trait         │      │  (evdev / queue) │   │
//! │                   └────────────────┘      └──────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod component_registry;
pub mod components;
pub mod core;
pub mod device;
pub mod record;

// Re-export key types for convenience
pub use crate::component_registry::{load_components, ComponentRegistry, LoadError};
pub use crate::core::{CycleError, VehicleCore};
