//! Keyboard component implementation.
//!
//! Each `sense` call drains every queued key event and folds them into one
//! `SparseUpdate`, which is then merged into the shared state. Relative
//! adjustments (arrows, trim) build on the running value: an earlier event
//! in the same drain is visible to later ones. The component keeps no state
//! of its own between drains.

use super::scan_codes::key_name;
use crate::device::{find_device, DeviceKind, EventKind, InputDevice, ScanEvent};
use crate::record::RecordFolders;
use derp_common::component::{Component, ComponentError};
use derp_common::config::{ComponentDescriptor, Configuration};
use derp_common::state::{Field, SparseUpdate, State, Value};
use serde::Deserialize;
use std::io;
use tracing::{debug, info, trace, warn};

/// Steering change per arrow press.
pub const STEER_STEP: f64 = 0.1;

/// Throttle change per arrow press.
pub const SPEED_STEP: f64 = 0.01;

/// Steering trim change per bracket press (1/256).
pub const STEER_OFFSET_STEP: f64 = 0.00390625;

/// Absolute throttle offset set by each digit key.
pub const SPEED_OFFSET_PRESETS: [(&str, f64); 10] = [
    ("1", 0.10),
    ("2", 0.12),
    ("3", 0.14),
    ("4", 0.16),
    ("5", 0.18),
    ("6", 0.20),
    ("7", 0.22),
    ("8", 0.24),
    ("9", 0.26),
    ("0", 0.28),
];

/// Events that carry no key information: `SYN_REPORT`, `KEY_RESERVED` and `MSC_SCAN`.
const NOISE_EVENTS: [(EventKind, u16); 3] = [
    (EventKind::Sync, 0),
    (EventKind::Key, 0),
    (EventKind::Misc, 4),
];

/// Keyboard-specific descriptor options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyboardOptions {
    /// Only accept a device with exactly this name.
    #[serde(default)]
    pub exact: Option<String>,
    /// Take exclusive access to the device.
    #[serde(default)]
    pub grab: bool,
}

/// Keyboard input component.
pub struct KeyboardComponent {
    name: String,
    options: KeyboardOptions,
    device: Option<Box<dyn InputDevice>>,
    record_folders: RecordFolders,
}

impl KeyboardComponent {
    /// Create a keyboard from its descriptor; the device is opened by `discover()`.
    pub fn new(
        descriptor: &ComponentDescriptor,
        config: &Configuration,
    ) -> Result<Self, ComponentError> {
        let options: KeyboardOptions = descriptor
            .options()
            .map_err(|e| ComponentError::InvalidOptions(e.to_string()))?;

        Ok(Self {
            name: descriptor.name.clone(),
            options,
            device: None,
            record_folders: RecordFolders::new(&config.data_dir),
        })
    }

    /// Use an already opened device instead of discovering one.
    pub fn with_device(mut self, device: Box<dyn InputDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Replace the record folder source.
    pub fn with_record_folders(mut self, record_folders: RecordFolders) -> Self {
        self.record_folders = record_folders;
        self
    }

    /// Descriptor options in effect.
    pub fn options(&self) -> &KeyboardOptions {
        &self.options
    }

    /// Take `device` as the input source, grabbing it when configured.
    ///
    /// A device that cannot be grabbed is dropped, which closes it.
    pub fn attach(&mut self, mut device: Box<dyn InputDevice>) -> Result<(), ComponentError> {
        if self.options.grab {
            device.grab().map_err(|e| {
                ComponentError::DeviceError(format!("cannot grab '{}': {e}", device.name()))
            })?;
        }

        info!("Keyboard '{}' using device '{}'", self.name, device.name());
        self.device = Some(device);
        Ok(())
    }

    /// Create a record folder for a new recording.
    fn start_recording(&self) -> Result<String, ComponentError> {
        self.record_folders
            .create()
            .map(|folder| folder.to_string_lossy().into_owned())
            .map_err(|e| {
                ComponentError::RecordFolderError(format!(
                    "{}: {e}",
                    self.record_folders.data_dir().display()
                ))
            })
    }

    /// Close the device, releasing any exclusive grab.
    pub fn release(&mut self) {
        if let Some(device) = self.device.take() {
            debug!("Keyboard '{}' releasing device '{}'", self.name, device.name());
        }
    }

    /// Fold one event into the pending update.
    fn process(
        &self,
        state: &State,
        out: &mut SparseUpdate,
        event: ScanEvent,
    ) -> Result<(), ComponentError> {
        if NOISE_EVENTS.contains(&(event.kind, event.code)) {
            return Ok(());
        }
        if event.kind != EventKind::Key {
            trace!("Ignoring {:?} event code={}", event.kind, event.code);
            return Ok(());
        }

        let key = key_name(event.code).ok_or(ComponentError::UnmappedScanCode(event.code))?;
        if !event.is_down() {
            return Ok(());
        }
        trace!("Keyboard '{}' key down: {}", self.name, key);

        match key {
            "arrow_left" => adjust(state, out, Field::Steer, -STEER_STEP),
            "arrow_right" => adjust(state, out, Field::Steer, STEER_STEP),
            "arrow_up" => adjust(state, out, Field::Speed, SPEED_STEP),
            "arrow_down" => adjust(state, out, Field::Speed, -SPEED_STEP),
            "[" => adjust(state, out, Field::SteerOffset, -STEER_OFFSET_STEP),
            "]" => adjust(state, out, Field::SteerOffset, STEER_OFFSET_STEP),
            "r" => match self.start_recording() {
                Ok(folder) => {
                    out.set(Field::Record, true);
                    out.set(Field::Folder, folder);
                }
                Err(e) => warn!("Keyboard '{}' cannot start recording: {}", self.name, e),
            },
            "e" => {
                out.set(Field::AutoSteer, true);
                out.set(Field::AutoSpeed, true);
            }
            "q" => out.set(Field::AutoSpeed, true),
            "w" => out.set(Field::AutoSteer, true),
            "s" => stop(out),
            "escape" => {
                stop(out);
                out.set(Field::Exit, true);
            }
            digit => {
                if let Some((_, preset)) = SPEED_OFFSET_PRESETS.iter().find(|(k, _)| *k == digit) {
                    out.set(Field::SpeedOffset, *preset);
                }
            }
        }
        Ok(())
    }
}

/// Add `delta` to the running value of `field`.
///
/// The running value is the pending update if this drain already touched the
/// field, else the shared state; absent or non-numeric values count as zero.
fn adjust(state: &State, out: &mut SparseUpdate, field: Field, delta: f64) {
    let current = out
        .get(field)
        .and_then(Value::as_f64)
        .or_else(|| state.number(field))
        .unwrap_or(0.0);
    out.set(field, current + delta);
}

/// Stop the car and recording, disengage autonomy.
fn stop(out: &mut SparseUpdate) {
    out.set(Field::Speed, 0.0);
    out.set(Field::Steer, 0.0);
    out.set(Field::Record, false);
    out.set(Field::Folder, false);
    out.set(Field::AutoSpeed, false);
    out.set(Field::AutoSteer, false);
}

/// Read until the device reports an empty queue.
fn drain(device: &mut dyn InputDevice) -> io::Result<Vec<ScanEvent>> {
    let mut events = Vec::new();
    loop {
        match device.read_events() {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => events.extend(batch),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }
    Ok(events)
}

impl Component for KeyboardComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&mut self) -> bool {
        if self.device.is_some() {
            return true;
        }

        let Some(device) = find_device(DeviceKind::Keyboard, self.options.exact.as_deref()) else {
            warn!(
                "Keyboard '{}': no device found (exact={:?})",
                self.name, self.options.exact
            );
            return false;
        };

        match self.attach(Box::new(device)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Keyboard '{}': {}", self.name, e);
                false
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.device.is_some()
    }

    fn sense(&mut self, state: &mut State) -> Result<bool, ComponentError> {
        let Some(device) = self.device.as_deref_mut() else {
            debug!("Keyboard '{}' has no device", self.name);
            return Ok(false);
        };

        let events = match drain(device) {
            Ok(events) => events,
            Err(e) => {
                warn!("Keyboard '{}' read failed: {}", self.name, e);
                return Ok(false);
            }
        };

        let mut out = SparseUpdate::new();
        for event in events {
            self.process(state, &mut out, event)?;
        }

        state.merge(out);
        Ok(true)
    }
}

impl Drop for KeyboardComponent {
    fn drop(&mut self) {
        self.release();
    }
}

/// Factory function registered for the `keyboard` class.
pub fn create_component(
    descriptor: &ComponentDescriptor,
    config: &Configuration,
) -> Result<Box<dyn Component>, ComponentError> {
    Ok(Box::new(KeyboardComponent::new(descriptor, config)?))
}
