//! System-wide constants.

/// File loaded when the configuration path points at a directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default record root, relative to the configuration directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default driver cycle time in microseconds (20 Hz).
pub const DEFAULT_CYCLE_TIME_US: u32 = 50_000;

/// State fields every system carries, with their initial values.
pub const SYSTEM_STATE_DEFAULTS: [(&str, f64); 2] = [("speed_offset", 0.0), ("steer_offset", 0.0)];

/// Configuration used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/derp/config.toml";
