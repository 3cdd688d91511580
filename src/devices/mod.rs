//! Device models for the flexibility environment.
//!
//! Every kind is a small state machine advanced one action per tick. The
//! producer kinds share one transition table and differ only in their
//! [`PowerCurve`]; storage, generator, and grid each carry their own table.
//! [`Device`] is the closed set the coordinator iterates over.

pub mod generator;
pub mod grid;
pub mod producer;
pub mod storage;
pub mod types;

pub use generator::{Generator, GeneratorAction, GeneratorState};
pub use grid::{GridAction, GridState, MainGrid};
pub use producer::{PowerCurve, Producer, ProducerAction, ProducerState};
pub use storage::{EnergyStorage, StorageAction, StorageState};
pub use types::{DEFAULT_PRODUCTION_TARGET, DeviceStep, OBS_EXTRA_SLOTS};

use crate::error::Result;

/// One registered device of any kind.
///
/// The set is closed: the coordinator, the scenario factory, and the
/// reports all match exhaustively, so adding a kind is a compile-visible
/// change.
#[derive(Debug, Clone)]
pub enum Device {
    Producer(Producer),
    Storage(EnergyStorage),
    Generator(Generator),
    Grid(MainGrid),
}

impl Device {
    /// Stable device identifier.
    pub fn name(&self) -> &str {
        match self {
            Device::Producer(d) => &d.name,
            Device::Storage(d) => &d.name,
            Device::Generator(d) => &d.name,
            Device::Grid(d) => &d.name,
        }
    }

    /// Configuration kind tag, as written in scenario files.
    pub fn kind(&self) -> &'static str {
        match self {
            Device::Producer(d) => match d.curve() {
                PowerCurve::Constant => "constant_producer",
                PowerCurve::Linear => "linear_producer",
                PowerCurve::Logistic => "logistic_producer",
            },
            Device::Storage(_) => "energy_storage",
            Device::Generator(_) => "generator",
            Device::Grid(_) => "main_grid",
        }
    }

    /// Advances the device by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EnvError::InvalidAction`] for an
    /// out-of-range action index.
    pub fn step(&mut self, action: usize) -> Result<DeviceStep> {
        match self {
            Device::Producer(d) => d.step(action),
            Device::Storage(d) => d.step(action),
            Device::Generator(d) => d.step(action),
            Device::Grid(d) => d.step(action),
        }
    }

    /// Restores the initial state and returns the initial observation.
    pub fn reset(&mut self) -> Vec<f32> {
        match self {
            Device::Producer(d) => d.reset(),
            Device::Storage(d) => d.reset(),
            Device::Generator(d) => d.reset(),
            Device::Grid(d) => d.reset(),
        }
    }

    /// Live power draw (negative for export).
    pub fn current_power(&self) -> f32 {
        match self {
            Device::Producer(d) => d.current_power(),
            Device::Storage(d) => d.current_power(),
            Device::Generator(d) => d.current_power(),
            Device::Grid(d) => d.current_power(),
        }
    }

    /// Reward for the most recent transition (after any production blend).
    pub fn current_reward(&self) -> f32 {
        match self {
            Device::Producer(d) => d.current_reward(),
            Device::Storage(d) => d.current_reward(),
            Device::Generator(d) => d.current_reward(),
            Device::Grid(d) => d.current_reward(),
        }
    }

    /// Human-readable name of the current state.
    pub fn state_name(&self) -> &'static str {
        match self {
            Device::Producer(d) => d.state().name(),
            Device::Storage(d) => d.state().name(),
            Device::Generator(d) => d.state().name(),
            Device::Grid(d) => d.state().name(),
        }
    }

    /// Size of this device's action alphabet.
    pub fn action_count(&self) -> usize {
        match self {
            Device::Producer(_) => ProducerAction::ALL.len(),
            Device::Storage(_) => StorageAction::ALL.len(),
            Device::Generator(_) => GeneratorAction::ALL.len(),
            Device::Grid(_) => GridAction::ALL.len(),
        }
    }

    /// Completed production cycles; `None` for kinds that do not produce.
    pub fn production_count(&self) -> Option<u32> {
        match self {
            Device::Producer(d) => Some(d.production_count()),
            _ => None,
        }
    }

    /// True once a producer has met its production target; always false for
    /// the other kinds.
    pub fn reached_production_target(&self) -> bool {
        match self {
            Device::Producer(d) => d.reached_production_target(),
            _ => false,
        }
    }

    /// Draws a uniformly random action index from this device's alphabet.
    pub fn sample_action(&mut self) -> usize {
        match self {
            Device::Producer(d) => d.sample_action(),
            Device::Storage(d) => d.sample_action(),
            Device::Generator(d) => d.sample_action(),
            Device::Grid(d) => d.sample_action(),
        }
    }

    /// Replaces the action-sampling RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        match self {
            Device::Producer(d) => d.reseed(seed),
            Device::Storage(d) => d.reseed(seed),
            Device::Generator(d) => d.reseed(seed),
            Device::Grid(d) => d.reseed(seed),
        }
    }

    /// Mutable access to the producer payload, used by the coordinator to
    /// write the blended production reward back.
    pub(crate) fn as_producer_mut(&mut self) -> Option<&mut Producer> {
        match self {
            Device::Producer(d) => Some(d),
            _ => None,
        }
    }
}
