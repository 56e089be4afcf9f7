//! Configuration resolution tests.
//!
//! Tests for `resolve_config()`: defaults-file merging, derived component
//! names, missing name/class rejection, system state defaults and
//! directory-or-file lookup.

use derp_common::config::{resolve_config, ConfigError};
use derp_common::consts::CONFIG_FILE_NAME;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a keyboard defaults file at `components/keyboard/default.toml`.
fn write_keyboard_defaults(dir: &Path) {
    let kb_dir = dir.join("components").join("keyboard");
    fs::create_dir_all(&kb_dir).unwrap();
    fs::write(
        kb_dir.join("default.toml"),
        r#"
class = "Keyboard"
required = true
exact = "AT Translated Set 2 keyboard"

[state]
record = false
speed = 0.0
"#,
    )
    .unwrap();
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
}

// ─── Tests ──────────────────────────────────────────────────────────

/// Test: entry values win over the defaults file.
#[test]
fn descriptor_wins_over_defaults() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_keyboard_defaults(dir);
    write_config(
        dir,
        r#"
name = "car"

[[components]]
path = "components/keyboard/default.toml"
required = false
exact = "USB Keyboard"
"#,
    );

    let config = resolve_config(dir).expect("should resolve");
    let kb = &config.components[0];
    assert_eq!(kb.class, "Keyboard");
    assert!(!kb.required);
    assert_eq!(kb.options["exact"].as_str(), Some("USB Keyboard"));
    assert_eq!(kb.state.flag("record"), Some(false));
}

/// Test: an entry with a path but no name takes the defaults directory name.
#[test]
fn name_derived_from_defaults_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_keyboard_defaults(dir);
    write_config(
        dir,
        r#"
[[components]]
path = "components/keyboard/default.toml"
"#,
    );

    let config = resolve_config(dir).unwrap();
    assert_eq!(config.components[0].name, "keyboard");
    assert_eq!(
        config.components[0].path.as_deref(),
        Some(Path::new("components/keyboard/default.toml"))
    );
}

/// Test: a name in the defaults file beats the derived name.
#[test]
fn defaults_file_name_beats_derived_name() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let pad_dir = dir.join("components").join("pad");
    fs::create_dir_all(&pad_dir).unwrap();
    fs::write(pad_dir.join("default.toml"), "name = \"gamepad\"\nclass = \"Keyboard\"\n").unwrap();
    write_config(
        dir,
        r#"
[[components]]
path = "components/pad/default.toml"
"#,
    );

    let config = resolve_config(dir).unwrap();
    assert_eq!(config.components[0].name, "gamepad");
}

/// Test: an entry without name or path aborts loading.
#[test]
fn missing_name_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[[components]]
class = "Keyboard"
"#,
    );

    let result = resolve_config(dir);
    assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("name")));
}

/// Test: an entry without class aborts loading, even with a name.
#[test]
fn missing_class_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[[components]]
name = "keyboard"
"#,
    );

    let result = resolve_config(dir);
    assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("class")));
}

/// Test: an empty class string counts as missing.
#[test]
fn empty_class_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[[components]]
name = "keyboard"
class = ""
"#,
    );

    assert!(matches!(
        resolve_config(dir),
        Err(ConfigError::ValidationError(_))
    ));
}

/// Test: root state gets system offsets unless they are set.
#[test]
fn system_state_defaults_seeded() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[state]
steer_offset = 0.2
"#,
    );

    let config = resolve_config(dir).unwrap();
    assert_eq!(config.state.number("steer_offset"), Some(0.2));
    assert_eq!(config.state.number("speed_offset"), Some(0.0));
}

/// Test: state section created when absent.
#[test]
fn state_section_created_when_absent() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(dir, "name = \"car\"\n");

    let config = resolve_config(dir).unwrap();
    assert_eq!(config.state.len(), 2);
    assert_eq!(config.name, "car");
}

/// Test: system name derived from the file name when loading a file directly.
#[test]
fn system_name_from_file_stem() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rover.toml");
    fs::write(&path, "cycle_time_us = 10000\n").unwrap();

    let config = resolve_config(&path).unwrap();
    assert_eq!(config.name, "rover");
    assert_eq!(config.cycle_time_us, 10_000);
    assert_eq!(config.config_dir(), tmp.path());
}

/// Test: data_dir resolved against the config directory.
#[test]
fn data_dir_relative_to_config() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(dir, "data_dir = \"recordings\"\n");

    let config = resolve_config(dir).unwrap();
    assert_eq!(config.data_dir, dir.join("recordings"));
}

/// Test: missing root file.
#[test]
fn missing_root_file() {
    let result = resolve_config(Path::new("/nonexistent/derp/config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

/// Test: missing defaults file referenced by an entry.
#[test]
fn missing_defaults_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[[components]]
path = "components/camera/default.toml"
"#,
    );

    assert!(matches!(
        resolve_config(dir),
        Err(ConfigError::FileNotFound(p)) if p.ends_with("components/camera/default.toml")
    ));
}

/// Test: malformed TOML.
#[test]
fn malformed_root_file() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), "name = [unclosed\n");

    assert!(matches!(
        resolve_config(tmp.path()),
        Err(ConfigError::ParseError(_))
    ));
}

/// Test: components keep declaration order.
#[test]
fn components_keep_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_config(
        dir,
        r#"
[[components]]
name = "b"
class = "Keyboard"

[[components]]
name = "a"
class = "Keyboard"
"#,
    );

    let config = resolve_config(dir).unwrap();
    let names: Vec<_> = config.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert!(config.component("a").is_some());
    assert!(config.component("c").is_none());
}

/// Test: the shipped example configuration resolves.
#[test]
fn example_config_resolves() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");

    let config = resolve_config(&dir).unwrap();
    assert_eq!(config.name, "derp");
    let kb = config.component("keyboard").expect("keyboard entry");
    assert_eq!(kb.class, "Keyboard");
    assert!(kb.required);
    assert_eq!(kb.state.flag("exit"), Some(false));
    assert_eq!(config.state.keys().collect::<Vec<_>>(), vec![
        "speed",
        "steer",
        "steer_offset",
        "speed_offset"
    ]);
}
