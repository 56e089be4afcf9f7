//! Vehicle component implementations.
//!
//! - [`keyboard`] - Keyboard input driving steering, throttle and recording
//!
//! # Adding New Components
//!
//! 1. Create a new submodule under `components/`
//! 2. Implement the `Component` trait from `derp_common::component`
//! 3. Register its factory in `register_builtin()` under its class name

pub mod keyboard;

use crate::component_registry::ComponentRegistry;

/// Register every built-in component class.
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry.register("keyboard", keyboard::create_component);
}
