//! Component registry.
//!
//! Provides a `ComponentRegistry` mapping implementation identifiers
//! (`class` in configuration, matched case-insensitively) to component
//! factories, and `load_components()` which turns a resolved configuration
//! into the shared state plus the list of active components.

use crate::components::register_builtin;
use derp_common::component::{Component, ComponentError, ComponentFactory};
use derp_common::config::{ComponentDescriptor, ConfigError, Configuration};
use derp_common::state::State;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for component loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Configuration could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No factory registered for the class
    #[error("Unknown component class: {0}")]
    UnknownClass(String),

    /// A required component is not ready
    #[error("Missing required component: {0}")]
    MissingRequired(String),

    /// Factory failed to construct the component
    #[error("Component '{name}' failed to initialize: {source}")]
    Component {
        /// Component instance name
        name: String,
        /// Underlying failure
        #[source]
        source: ComponentError,
    },
}

/// Registry of available component classes.
///
/// Constructed at startup, populated via `register()`. No global state.
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in component.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin(&mut registry);
        registry
    }

    /// Register a component factory.
    ///
    /// # Panics
    /// Panics if a component with the same class is already registered.
    pub fn register(&mut self, class: &str, factory: ComponentFactory) {
        let key = class.to_lowercase();
        if self.factories.contains_key(&key) {
            panic!("Component class '{key}' is already registered");
        }
        self.factories.insert(key, factory);
    }

    /// Get a component factory by class, ignoring case.
    pub fn get_factory(&self, class: &str) -> Option<ComponentFactory> {
        self.factories.get(&class.to_lowercase()).copied()
    }

    /// List all registered classes.
    pub fn list_components(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct a component and run its discovery.
    ///
    /// Returns `Ok(None)` if the component is not ready and not required;
    /// the caller leaves it out of the active list.
    ///
    /// # Errors
    /// - `LoadError::UnknownClass` if no factory matches `descriptor.class`
    /// - `LoadError::Component` if the factory fails
    /// - `LoadError::MissingRequired` if a required component is not ready
    pub fn instantiate(
        &self,
        descriptor: &ComponentDescriptor,
        config: &Configuration,
    ) -> Result<Option<Box<dyn Component>>, LoadError> {
        let factory = self
            .get_factory(&descriptor.class)
            .ok_or_else(|| LoadError::UnknownClass(descriptor.class.clone()))?;

        let mut component =
            factory(descriptor, config).map_err(|source| LoadError::Component {
                name: descriptor.name.clone(),
                source,
            })?;

        component.discover();
        if component.is_ready() {
            info!("Loaded component '{}' ({})", descriptor.name, descriptor.class);
            return Ok(Some(component));
        }

        if descriptor.required {
            return Err(LoadError::MissingRequired(descriptor.name.clone()));
        }
        warn!(
            "Skipping component '{}' ({}): not ready",
            descriptor.name, descriptor.class
        );
        Ok(None)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the shared state and every active component.
///
/// State starts from the configuration's root `state` section. Each
/// descriptor's own `state` defaults are then seeded in declaration order,
/// and only into fields that are absent or `Null`. The first explicit value
/// for a field wins, so reordering components can change initial state.
///
/// # Errors
/// Any `LoadError` from `ComponentRegistry::instantiate`; no partial system
/// is returned.
pub fn load_components(
    registry: &ComponentRegistry,
    config: &Configuration,
) -> Result<(State, Vec<Box<dyn Component>>), LoadError> {
    let mut state = State::from_defaults(&config.state);
    let mut components = Vec::with_capacity(config.components.len());

    for descriptor in &config.components {
        if let Some(component) = registry.instantiate(descriptor, config)? {
            components.push(component);
        }

        for (key, value) in descriptor.state.iter() {
            if state.seed(key, value.clone()) {
                debug!("  {} seeded {} = {}", descriptor.name, key, value);
            }
        }
    }

    info!(
        "Loaded {} of {} components, {} state fields",
        components.len(),
        config.components.len(),
        state.len()
    );
    Ok((state, components))
}
