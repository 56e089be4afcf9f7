//! Vehicle core and cycle loop.
//!
//! The `VehicleCore` owns the shared `State` and the active components and
//! runs them once per cycle: every `sense`, then every `act`, then every
//! `scribe`, each in configuration order. A cycle completes fully before the
//! next one starts. Shutdown is requested through the `exit` state field or
//! the running flag.

use crate::component_registry::{load_components, ComponentRegistry, LoadError};
use derp_common::component::{Component, ComponentError};
use derp_common::config::Configuration;
use derp_common::state::{Field, State};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for the cycle loop.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A component's sense step hit a fatal error
    #[error("Component '{name}' failed to sense: {source}")]
    Sense {
        /// Component instance name
        name: String,
        /// Underlying failure
        #[source]
        source: ComponentError,
    },
}

/// Timing statistics for loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Number of cycles that exceeded the target cycle time
    pub overruns: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
}

/// Vehicle core: shared state, active components and the cycle loop.
pub struct VehicleCore {
    name: String,
    state: State,
    components: Vec<Box<dyn Component>>,
    running: Arc<AtomicBool>,
    cycle_time: Duration,
    stats: TimingStats,
}

impl VehicleCore {
    /// Create a core from already loaded state and components.
    pub fn new(config: &Configuration, state: State, components: Vec<Box<dyn Component>>) -> Self {
        info!(
            "VehicleCore '{}' created with {} components, cycle_time={}us",
            config.name,
            components.len(),
            config.cycle_time_us
        );
        Self {
            name: config.name.clone(),
            state,
            components,
            running: Arc::new(AtomicBool::new(false)),
            cycle_time: Duration::from_micros(config.cycle_time_us as u64),
            stats: TimingStats::default(),
        }
    }

    /// Load every component of `config` through `registry`.
    ///
    /// # Errors
    /// Any `LoadError` from `load_components()`.
    pub fn load(registry: &ComponentRegistry, config: &Configuration) -> Result<Self, LoadError> {
        let (state, components) = load_components(registry, config)?;
        Ok(Self::new(config, state, components))
    }

    /// Run one cycle.
    ///
    /// Returns `true` if a component requested shutdown through `exit`.
    ///
    /// # Errors
    /// `CycleError::Sense` if a component reports a fatal sense error.
    pub fn run_cycle(&mut self) -> Result<bool, CycleError> {
        for component in &mut self.components {
            let ok = component
                .sense(&mut self.state)
                .map_err(|source| CycleError::Sense {
                    name: component.name().to_string(),
                    source,
                })?;
            if !ok {
                debug!("Component '{}' sense incomplete", component.name());
            }
        }

        for component in &mut self.components {
            if !component.act(&mut self.state) {
                debug!("Component '{}' act incomplete", component.name());
            }
        }

        for component in &mut self.components {
            if !component.scribe(&mut self.state) {
                debug!("Component '{}' scribe incomplete", component.name());
            }
        }

        Ok(self.state.flag(Field::Exit) == Some(true))
    }

    /// Run cycles until `exit` is set, the running flag is cleared or
    /// `max_cycles` is reached.
    ///
    /// # Errors
    /// Stops at the first `CycleError`.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        info!(
            "Starting '{}' cycle loop (cycle_time={}us)...",
            self.name,
            self.cycle_time.as_micros()
        );
        self.running.store(true, Ordering::SeqCst);

        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let exit = self.run_cycle()?;

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            self.stats.cycle_count += 1;
            self.stats.total_cycle_time_us += cycle_time_us;
            self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);

            if cycle_time_us > self.cycle_time.as_micros() as u64 {
                self.stats.overruns += 1;
                if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        "Cycle overrun #{}: cycle took {}us (target {}us)",
                        self.stats.overruns,
                        cycle_time_us,
                        self.cycle_time.as_micros()
                    );
                }
            }

            if exit {
                info!("Exit requested after {} cycles", self.stats.cycle_count);
                break;
            }
            if max_cycles.is_some_and(|max| self.stats.cycle_count >= max) {
                info!("Reached cycle limit of {}", self.stats.cycle_count);
                break;
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Cycle loop stopped after {} cycles (overruns: {})",
            self.stats.cycle_count, self.stats.overruns
        );
        Ok(())
    }

    /// Flush every component's output.
    pub fn shutdown(&mut self) {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        for component in &mut self.components {
            if !component.write() {
                warn!("Component '{}' failed to flush output", component.name());
            }
        }
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Current shared state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Names of the active components, in cycle order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        self.stats
    }
}
