//! Battery-style energy storage with a charge-level reward curve.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::devices::types::{DeviceStep, state_observation};
use crate::error::{EnvError, Result};

/// States of the storage unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    Stopped = 0,
    Aborted = 1,
    Charging = 2,
    Discharging = 3,
}

impl StorageState {
    /// Number of one-hot slots in the observation vector.
    pub const COUNT: usize = 4;

    /// All states in ordinal order.
    pub const ALL: [StorageState; 4] = [
        StorageState::Stopped,
        StorageState::Aborted,
        StorageState::Charging,
        StorageState::Discharging,
    ];

    /// Position of this state's one-hot slot.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Human-readable state name.
    pub fn name(self) -> &'static str {
        match self {
            StorageState::Stopped => "Stopped",
            StorageState::Aborted => "Aborted",
            StorageState::Charging => "Charging",
            StorageState::Discharging => "Discharging",
        }
    }
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action alphabet of the storage unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAction {
    Sc = 0,
    Abort = 1,
    Clear = 2,
    Charge = 3,
    Stop = 4,
    Discharge = 5,
}

impl StorageAction {
    /// All actions in index order.
    pub const ALL: [StorageAction; 6] = [
        StorageAction::Sc,
        StorageAction::Abort,
        StorageAction::Clear,
        StorageAction::Charge,
        StorageAction::Stop,
        StorageAction::Discharge,
    ];

    /// Decodes an integer action index; `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable action name.
    pub fn name(self) -> &'static str {
        match self {
            StorageAction::Sc => "SC",
            StorageAction::Abort => "Abort",
            StorageAction::Clear => "Clear",
            StorageAction::Charge => "Charge",
            StorageAction::Stop => "Stop",
            StorageAction::Discharge => "Discharge",
        }
    }
}

impl fmt::Display for StorageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An energy storage unit.
///
/// The charge level moves by `p_slope` on every tick spent in `Charging` or
/// `Discharging` (including the tick that leaves the state) and is clamped to
/// `[p_min, p_max]`. While charging or discharging, the reward follows a
/// quadratic efficiency curve that peaks at full charge, evaluated at the
/// level before the tick's movement.
#[derive(Debug, Clone)]
pub struct EnergyStorage {
    /// Stable identifier used in traces and reports.
    pub name: String,
    /// Lowest admissible charge level.
    pub p_min: f32,
    /// Highest admissible charge level, also the curve's peak.
    pub p_max: f32,
    /// Charge/discharge rate per tick.
    pub p_slope: f32,
    max_allowed_power: f32,
    state: StorageState,
    charging_level: f32,
    current_reward: f32,
    rng: StdRng,
}

impl EnergyStorage {
    /// Creates a storage unit in the `Stopped` state with an empty charge.
    ///
    /// # Errors
    ///
    /// Returns a config error if `max_allowed_power` or `p_max` is not
    /// strictly positive (`p_max` divides the efficiency curve).
    pub fn new(
        name: impl Into<String>,
        p_min: f32,
        p_max: f32,
        p_slope: f32,
        max_allowed_power: f32,
        seed: u64,
    ) -> Result<Self> {
        let name = name.into();
        if max_allowed_power <= 0.0 {
            return Err(EnvError::config(
                format!("devices.{name}.max_allowed_power"),
                "must be strictly positive",
            ));
        }
        if p_max <= 0.0 {
            return Err(EnvError::config(
                format!("devices.{name}.p_max"),
                "must be strictly positive",
            ));
        }
        Ok(Self {
            name,
            p_min,
            p_max,
            p_slope,
            max_allowed_power,
            state: StorageState::Stopped,
            charging_level: 0.0,
            current_reward: 0.0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Applies one action, returning the observation, reward, done flag, and
    /// transition trace for this tick.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidAction`] for an out-of-range index; the
    /// unit is left untouched in that case.
    pub fn step(&mut self, action: usize) -> Result<DeviceStep> {
        let Some(action) = StorageAction::from_index(action) else {
            return Err(EnvError::InvalidAction {
                device: self.name.clone(),
                action,
                alphabet: StorageAction::ALL.len(),
            });
        };

        let prev = self.state;
        self.apply(action);
        let reward = self.current_reward;
        let observation = self.observation();
        let done = self.state == StorageState::Aborted;

        Ok(DeviceStep {
            observation,
            reward,
            done,
            trace: format!("{prev} => {action} => {}", self.state),
            cycle_completed: false,
        })
    }

    /// Returns the unit to `Stopped` with an empty charge and yields the
    /// initial observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.state = StorageState::Stopped;
        self.charging_level = 0.0;
        self.current_reward = 0.0;
        self.observation()
    }

    /// Power draw for the current state and charge level.
    ///
    /// Charging draws half the level span until the unit is full;
    /// discharging exports the same amount until the unit is empty.
    pub fn current_power(&self) -> f32 {
        match self.state {
            StorageState::Charging if self.charging_level < self.p_max => {
                (self.p_max - self.p_min) / 2.0
            }
            StorageState::Discharging if self.charging_level > self.p_min => {
                -(self.p_max - self.p_min) / 2.0
            }
            _ => 0.0,
        }
    }

    /// Current observation vector.
    pub fn observation(&self) -> Vec<f32> {
        state_observation(
            self.state.ordinal(),
            StorageState::COUNT,
            self.current_power(),
            self.max_allowed_power,
        )
    }

    /// Draws a uniformly random action index from this unit's alphabet.
    pub fn sample_action(&mut self) -> usize {
        self.rng.random_range(0..StorageAction::ALL.len())
    }

    /// Replaces the action-sampling RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Current state.
    pub fn state(&self) -> StorageState {
        self.state
    }

    /// Reward computed for the most recent transition.
    pub fn current_reward(&self) -> f32 {
        self.current_reward
    }

    /// Current charge level.
    pub fn charging_level(&self) -> f32 {
        self.charging_level
    }

    /// Quadratic efficiency reward, highest near full charge.
    fn level_reward(&self) -> f32 {
        let gap = self.p_max - self.charging_level;
        0.5 * (1.0 - (gap * gap) / (self.p_max * self.p_max))
    }

    fn apply(&mut self, action: StorageAction) {
        use StorageAction as A;
        use StorageState as S;

        match self.state {
            S::Stopped => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Charge => {
                    self.state = S::Charging;
                    self.current_reward = 0.1;
                }
                A::Discharge => {
                    self.state = S::Discharging;
                    self.current_reward = 0.1;
                }
                _ => self.current_reward = 0.0,
            },
            S::Aborted => match action {
                A::Clear => {
                    self.state = S::Stopped;
                    self.current_reward = 1.0;
                }
                _ => self.current_reward = 0.0,
            },
            S::Charging => {
                match action {
                    A::Abort => {
                        self.state = S::Aborted;
                        self.current_reward = -0.1;
                    }
                    A::Stop => {
                        self.state = S::Stopped;
                        self.current_reward = 0.0;
                    }
                    A::Discharge => {
                        self.state = S::Discharging;
                        self.current_reward = self.level_reward();
                    }
                    _ => self.current_reward = self.level_reward(),
                }
                // The tick spent charging moves the level regardless of
                // where the transition lands.
                self.charging_level = (self.charging_level + self.p_slope).min(self.p_max);
            }
            S::Discharging => {
                match action {
                    A::Abort => {
                        self.state = S::Aborted;
                        self.current_reward = -0.1;
                    }
                    A::Stop => {
                        self.state = S::Stopped;
                        self.current_reward = 0.0;
                    }
                    A::Charge => {
                        self.state = S::Charging;
                        self.current_reward = self.level_reward();
                    }
                    _ => self.current_reward = self.level_reward(),
                }
                self.charging_level = (self.charging_level - self.p_slope).max(self.p_min);
            }
        }
    }
}
