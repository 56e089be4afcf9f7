//! Component trait and error types.
//!
//! This module defines:
//! - `Component` trait - Lifecycle every vehicle component implements
//! - `ComponentError` enum - Error types for component operations
//! - `ComponentFactory` type alias - Factory function type

use crate::config::{ComponentDescriptor, Configuration};
use crate::state::State;
use thiserror::Error;

/// Error types for component operations.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    /// Options in the component's descriptor could not be decoded
    #[error("Invalid component options: {0}")]
    InvalidOptions(String),

    /// Device could not be opened or configured
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Key event with a code missing from the scan-code table
    #[error("Unmapped scan code: {0}")]
    UnmappedScanCode(u16),

    /// Record folder could not be created
    #[error("Record folder error: {0}")]
    RecordFolderError(String),
}

/// Factory function type for creating component instances.
pub type ComponentFactory =
    fn(&ComponentDescriptor, &Configuration) -> Result<Box<dyn Component>, ComponentError>;

/// Trait defining the lifecycle of a vehicle component.
///
/// The driver owns every component and the shared `State`, and lends the
/// state to one component step at a time.
///
/// # Lifecycle
///
/// 1. `discover()` - Called once at startup to locate backing devices
/// 2. `sense()` / `act()` / `scribe()` - Called every cycle, in driver order
/// 3. `write()` - Called once when the driver stops
///
/// Device handles are owned values; implementations release them on drop so
/// cleanup runs on every exit path.
///
/// A `false` return means the step did not complete its work. It never means
/// the shared state was left inconsistent.
pub trait Component: Send {
    /// Returns the component's instance name.
    fn name(&self) -> &str;

    /// Locate and open backing devices.
    ///
    /// Returns whether discovery succeeded.
    fn discover(&mut self) -> bool;

    /// Whether the component can run: discovery succeeded, or no device is needed.
    fn is_ready(&self) -> bool;

    /// Read from the device or world and write derived values into `state`.
    ///
    /// An empty input queue is a normal result, not an error.
    ///
    /// # Errors
    /// Only for programming errors that must stop the vehicle, such as a
    /// device reporting a key code the component does not know.
    fn sense(&mut self, state: &mut State) -> Result<bool, ComponentError>;

    /// Read `state` and drive an actuator.
    /// Default: no-op
    fn act(&mut self, _state: &mut State) -> bool {
        true
    }

    /// Persist or transmit `state`.
    /// Default: no-op
    fn scribe(&mut self, _state: &mut State) -> bool {
        true
    }

    /// Flush buffered output.
    /// Default: no-op
    fn write(&mut self) -> bool {
        true
    }
}
