//! Keyboard component module.
//!
//! Drives steering, throttle, trim, autonomy and recording from a PC
//! keyboard attached as a Linux event device.

mod component;
mod scan_codes;

pub use component::{
    create_component, KeyboardComponent, KeyboardOptions, SPEED_OFFSET_PRESETS, SPEED_STEP,
    STEER_OFFSET_STEP, STEER_STEP,
};
pub use scan_codes::key_name;
