//! Component loading tests.
//!
//! Resolves configurations from disk and loads them through a registry:
//! state seeding precedence and order sensitivity, required/optional
//! readiness handling, unknown classes, and a full cycle through
//! `VehicleCore`.

use derp_common::component::{Component, ComponentError};
use derp_common::config::{resolve_config, ComponentDescriptor, Configuration};
use derp_common::consts::CONFIG_FILE_NAME;
use derp_common::state::State;
use derp_vehicle::{load_components, ComponentRegistry, LoadError, VehicleCore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ─── Helpers ────────────────────────────────────────────────────────

/// Component with no device; readiness is fixed by its class.
struct Probe {
    name: String,
    ready: bool,
    writes: Option<(String, f64)>,
}

impl Component for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&mut self) -> bool {
        self.ready
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn sense(&mut self, state: &mut State) -> Result<bool, ComponentError> {
        if let Some((key, value)) = &self.writes {
            state.set(key, *value);
        }
        Ok(true)
    }
}

fn create_probe(
    descriptor: &ComponentDescriptor,
    _config: &Configuration,
) -> Result<Box<dyn Component>, ComponentError> {
    #[derive(serde::Deserialize)]
    struct Options {
        sets: Option<String>,
        to: Option<f64>,
    }
    let options: Options = descriptor
        .options()
        .map_err(|e| ComponentError::InvalidOptions(e.to_string()))?;

    Ok(Box::new(Probe {
        name: descriptor.name.clone(),
        ready: true,
        writes: options.sets.zip(options.to),
    }))
}

fn create_offline(
    descriptor: &ComponentDescriptor,
    _config: &Configuration,
) -> Result<Box<dyn Component>, ComponentError> {
    Ok(Box::new(Probe {
        name: descriptor.name.clone(),
        ready: false,
        writes: None,
    }))
}

fn registry() -> ComponentRegistry {
    let mut reg = ComponentRegistry::new();
    reg.register("Probe", create_probe);
    reg.register("Offline", create_offline);
    reg
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
}

fn load(content: &str) -> Result<(State, Vec<Box<dyn Component>>), LoadError> {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), content);
    let config = resolve_config(tmp.path())?;
    load_components(&registry(), &config)
}

// ─── Tests ──────────────────────────────────────────────────────────

/// Test: a component default never overwrites a root value.
#[test]
fn root_state_beats_component_defaults() {
    let (state, _) = load(
        r#"
[state]
steer_offset = 0.2

[[components]]
name = "servo"
class = "probe"

[components.state]
steer_offset = 0.0
camera_fps = 30
"#,
    )
    .unwrap();

    assert_eq!(state.number("steer_offset"), Some(0.2));
    assert_eq!(state.number("camera_fps"), Some(30.0));
    assert_eq!(state.number("speed_offset"), Some(0.0));
}

/// Test: the first component to declare a field decides its initial value.
#[test]
fn seeding_follows_declaration_order() {
    let first = r#"
[[components]]
name = "a"
class = "Probe"
[components.state]
speed = 0.1

[[components]]
name = "b"
class = "Probe"
[components.state]
speed = 0.5
"#;
    let (state, _) = load(first).unwrap();
    assert_eq!(state.number("speed"), Some(0.1));

    let swapped = r#"
[[components]]
name = "b"
class = "Probe"
[components.state]
speed = 0.5

[[components]]
name = "a"
class = "Probe"
[components.state]
speed = 0.1
"#;
    let (state, _) = load(swapped).unwrap();
    assert_eq!(state.number("speed"), Some(0.5));
}

/// Test: a field declared null by a general component is filled by a later one.
#[test]
fn null_default_filled_by_later_component() {
    let (state, _) = load(
        r#"
[[components]]
name = "driver"
class = "Probe"
[components.state]
speed = {}

[[components]]
name = "throttle"
class = "Probe"
[components.state]
speed = 0.3
"#,
    )
    .unwrap();

    assert_eq!(state.number("speed"), Some(0.3));
}

/// Test: a null declared last stays null.
#[test]
fn null_default_alone_stays_null() {
    let (state, _) = load(
        r#"
[[components]]
name = "driver"
class = "Probe"
[components.state]
speed = {}
"#,
    )
    .unwrap();

    assert!(state.get("speed").is_some_and(|v| v.is_null()));
}

/// Test: a required component that is not ready aborts loading.
#[test]
fn required_component_missing() {
    let result = load(
        r#"
[[components]]
name = "keyboard"
class = "Offline"
required = true
"#,
    );
    assert!(matches!(result, Err(LoadError::MissingRequired(n)) if n == "keyboard"));
}

/// Test: an optional component that is not ready is left out, loading continues.
#[test]
fn optional_component_skipped() {
    let (state, components) = load(
        r#"
[[components]]
name = "keyboard"
class = "Offline"
[components.state]
record = false

[[components]]
name = "servo"
class = "Probe"
"#,
    )
    .unwrap();

    let names: Vec<_> = components.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["servo"]);
    assert_eq!(state.flag("record"), Some(false));
}

/// Test: unknown class aborts loading.
#[test]
fn unknown_class() {
    let result = load(
        r#"
[[components]]
name = "lidar"
class = "Lidar"
"#,
    );
    assert!(matches!(result, Err(LoadError::UnknownClass(c)) if c == "Lidar"));
}

/// Test: configuration errors surface as load errors.
#[test]
fn config_error_propagates() {
    let result = load(
        r#"
[[components]]
class = "Probe"
"#,
    );
    assert!(matches!(result, Err(LoadError::Config(_))));
}

/// Test: defaults file, options and a full cycle through the core.
#[test]
fn defaults_file_drives_a_cycle() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let probe_dir = dir.join("components").join("throttle");
    fs::create_dir_all(&probe_dir).unwrap();
    fs::write(
        probe_dir.join("default.toml"),
        r#"
class = "Probe"
sets = "speed"
to = 0.25

[state]
speed = 0.0
"#,
    )
    .unwrap();
    write_config(
        dir,
        r#"
name = "car"
cycle_time_us = 1000

[[components]]
path = "components/throttle/default.toml"
to = 0.5
"#,
    );

    let config = resolve_config(dir).unwrap();
    let mut core = VehicleCore::load(&registry(), &config).unwrap();
    assert_eq!(core.component_names(), vec!["throttle"]);
    assert_eq!(core.state().number("speed"), Some(0.0));

    assert!(!core.run_cycle().unwrap());
    assert_eq!(core.state().number("speed"), Some(0.5));
}
