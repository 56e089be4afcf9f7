//! Configuration resolution.
//!
//! A vehicle is described by a root `config.toml`:
//!
//! ```toml
//! name = "car"
//! data_dir = "/var/lib/derp"
//!
//! [[components]]
//! class = "Keyboard"
//! path = "components/keyboard/default.toml"
//! required = false
//! exact = "AT Translated Set 2 keyboard"
//!
//! [components.state]
//! record = false
//!
//! [state]
//! steer_offset = 0.2
//! ```
//!
//! Each component entry may point at a defaults file through `path`. Keys
//! from the defaults file are copied only when the entry does not define
//! them, so the entry always wins. Entries without a `name` take the name
//! of the directory holding their defaults file.
//!
//! TOML has no null, so a state field written as an empty inline table
//! (`speed = {}`) declares the field as `Null`. A later component in
//! declaration order may then seed it with a concrete value.

use crate::consts::{CONFIG_FILE_NAME, DEFAULT_CYCLE_TIME_US, DEFAULT_DATA_DIR, SYSTEM_STATE_DEFAULTS};
use crate::state::{StateDefaults, Value};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File could not be read or TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// One component entry after defaults have been merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    /// Component instance name (unique by convention).
    pub name: String,
    /// Implementation identifier, matched case-insensitively.
    pub class: String,
    /// Defaults file the entry was merged with, as written.
    pub path: Option<PathBuf>,
    /// Abort loading if the component is not ready.
    pub required: bool,
    /// State fields the component declares, with their defaults.
    pub state: StateDefaults,
    /// Implementation-specific options (every other key).
    pub options: toml::Table,
}

impl ComponentDescriptor {
    /// Decode the implementation-specific options into `T`.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "component '{}': invalid options: {e}",
                    self.name
                ))
            })
    }
}

/// Fully resolved system configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// System name.
    pub name: String,
    /// Root file the configuration was loaded from.
    pub source: PathBuf,
    /// Component entries in declaration order.
    pub components: Vec<ComponentDescriptor>,
    /// Initial shared state, seeded with system defaults.
    pub state: StateDefaults,
    /// Root directory for record folders.
    pub data_dir: PathBuf,
    /// Driver cycle time in microseconds.
    pub cycle_time_us: u32,
}

impl Configuration {
    /// Find a component entry by name.
    pub fn component(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Directory relative paths are resolved against.
    pub fn config_dir(&self) -> &Path {
        self.source.parent().unwrap_or(Path::new("."))
    }
}

/// Load and resolve a configuration file or directory.
///
/// # Errors
///
/// - `ConfigError::FileNotFound` if the root or a defaults file is missing
/// - `ConfigError::ParseError` if a file cannot be read or parsed
/// - `ConfigError::ValidationError` if an entry lacks a name or class, or a
///   field has the wrong type
pub fn resolve_config(path: &Path) -> Result<Configuration, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    info!("Loading configuration from {:?}", config_path);

    let root = load_table(&config_path)?;
    let config = resolve_document(root, &config_path)?;

    info!(
        "Resolved configuration '{}': {} components, {} state fields",
        config.name,
        config.components.len(),
        config.state.len()
    );
    Ok(config)
}

/// Resolve an already parsed root document that was read from `config_path`.
pub fn resolve_document(
    mut root: toml::Table,
    config_path: &Path,
) -> Result<Configuration, ConfigError> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));

    let name = match take_string(&mut root, "name", "root")? {
        Some(name) => name,
        None => config_name(config_path),
    };

    let entries = match root.remove("components") {
        None => Vec::new(),
        Some(toml::Value::Array(items)) => items,
        Some(other) => {
            return Err(ConfigError::ValidationError(format!(
                "'components' must be an array of tables, found {}",
                other.type_str()
            )));
        }
    };

    let mut components = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let toml::Value::Table(entry) = entry else {
            return Err(ConfigError::ValidationError(format!(
                "component #{idx} must be a table"
            )));
        };
        let descriptor = resolve_component(idx, entry, config_dir)?;
        debug!(
            "  Component {}: {} (class={}, required={})",
            idx, descriptor.name, descriptor.class, descriptor.required
        );
        components.push(descriptor);
    }

    let mut state = state_section(root.remove("state"), "root")?;
    for (key, value) in SYSTEM_STATE_DEFAULTS {
        if !state.contains(key) {
            state.set(key, value);
        }
    }

    let data_dir = match take_string(&mut root, "data_dir", "root")? {
        Some(dir) => config_dir.join(dir),
        None => config_dir.join(DEFAULT_DATA_DIR),
    };

    let cycle_time_us = match root.remove("cycle_time_us") {
        None => DEFAULT_CYCLE_TIME_US,
        Some(toml::Value::Integer(us)) if us > 0 && us <= u32::MAX as i64 => us as u32,
        Some(other) => {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_us must be a positive integer, found {other}"
            )));
        }
    };

    for key in root.keys() {
        debug!("Ignoring unknown root key '{}'", key);
    }

    Ok(Configuration {
        name,
        source: config_path.to_path_buf(),
        components,
        state,
        data_dir,
        cycle_time_us,
    })
}

/// Merge an entry with its defaults file and validate it.
fn resolve_component(
    idx: usize,
    mut entry: toml::Table,
    config_dir: &Path,
) -> Result<ComponentDescriptor, ConfigError> {
    let context = format!("component #{idx}");
    let path = take_string(&mut entry, "path", &context)?;

    if let Some(rel) = &path {
        let defaults = load_table(&config_dir.join(rel))?;
        merge_defaults(&mut entry, defaults);

        if !entry.contains_key("name") {
            if let Some(derived) = derive_component_name(rel) {
                entry.insert("name".to_string(), toml::Value::String(derived));
            }
        }
    }

    let name = take_string(&mut entry, "name", &context)?
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "{context}: all components must have a name or a path"
            ))
        })?;

    let class = take_string(&mut entry, "class", &name)?
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "component '{name}': all components must have a class"
            ))
        })?;

    let required = match entry.remove("required") {
        None => false,
        Some(toml::Value::Boolean(required)) => required,
        Some(other) => {
            return Err(ConfigError::ValidationError(format!(
                "component '{name}': 'required' must be a boolean, found {}",
                other.type_str()
            )));
        }
    };

    let state = state_section(entry.remove("state"), &name)?;

    Ok(ComponentDescriptor {
        name,
        class,
        path: path.map(PathBuf::from),
        required,
        state,
        options: entry,
    })
}

/// Copy every key of `defaults` that `entry` does not define.
fn merge_defaults(entry: &mut toml::Table, defaults: toml::Table) {
    for (key, value) in defaults {
        if !entry.contains_key(&key) {
            entry.insert(key, value);
        }
    }
}

/// Name of the directory holding a defaults file.
fn derive_component_name(path: &str) -> Option<String> {
    Path::new(path)
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

/// File base name without extension.
fn config_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ParseError(format!("Failed to read {:?}: {}", path, e))
        }
    })?;

    toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("Failed to parse {:?}: {}", path, e)))
}

fn take_string(
    table: &mut toml::Table,
    key: &str,
    context: &str,
) -> Result<Option<String>, ConfigError> {
    match table.remove(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ConfigError::ValidationError(format!(
            "{context}: '{key}' must be a string, found {}",
            other.type_str()
        ))),
    }
}

fn state_section(
    section: Option<toml::Value>,
    context: &str,
) -> Result<StateDefaults, ConfigError> {
    let mut state = StateDefaults::new();
    let table = match section {
        None => return Ok(state),
        Some(toml::Value::Table(table)) => table,
        Some(other) => {
            return Err(ConfigError::ValidationError(format!(
                "{context}: 'state' must be a table, found {}",
                other.type_str()
            )));
        }
    };

    for (key, value) in table {
        let value = state_value(&key, value, context)?;
        state.set(key, value);
    }
    Ok(state)
}

fn state_value(key: &str, value: toml::Value, context: &str) -> Result<Value, ConfigError> {
    match value {
        toml::Value::Boolean(b) => Ok(Value::Bool(b)),
        toml::Value::Integer(i) => Ok(Value::Number(i as f64)),
        toml::Value::Float(f) => Ok(Value::Number(f)),
        toml::Value::String(s) => Ok(Value::Text(s)),
        toml::Value::Table(t) if t.is_empty() => Ok(Value::Null),
        other => Err(ConfigError::ValidationError(format!(
            "{context}: state field '{key}' has unsupported type {}",
            other.type_str()
        ))),
    }
}
