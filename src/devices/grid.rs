//! Grid connection point that buys or sells at full rated power.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::devices::types::{DeviceStep, state_observation};
use crate::error::{EnvError, Result};

/// States of the grid connection.
///
/// Ordinals are non-contiguous: `Selling` sits at 4, so its one-hot lands
/// in the slot every other device kind leaves reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    Aborted = 0,
    Stopped = 1,
    Buying = 2,
    Selling = 4,
}

impl GridState {
    /// Number of states; the observation adds the usual two extra slots on
    /// top, which is exactly enough room for `Selling`'s ordinal.
    pub const COUNT: usize = 4;

    /// All states in declaration order.
    pub const ALL: [GridState; 4] = [
        GridState::Aborted,
        GridState::Stopped,
        GridState::Buying,
        GridState::Selling,
    ];

    /// Position of this state's one-hot slot.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Human-readable state name.
    pub fn name(self) -> &'static str {
        match self {
            GridState::Aborted => "Aborted",
            GridState::Stopped => "Stopped",
            GridState::Buying => "Buying",
            GridState::Selling => "Selling",
        }
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action alphabet of the grid connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    Sc = 0,
    Abort = 1,
    Clear = 2,
    Stop = 3,
    Buy = 4,
    Sell = 5,
}

impl GridAction {
    /// All actions in index order.
    pub const ALL: [GridAction; 6] = [
        GridAction::Sc,
        GridAction::Abort,
        GridAction::Clear,
        GridAction::Stop,
        GridAction::Buy,
        GridAction::Sell,
    ];

    /// Decodes an integer action index; `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable action name.
    pub fn name(self) -> &'static str {
        match self {
            GridAction::Sc => "SC",
            GridAction::Abort => "Abort",
            GridAction::Clear => "Clear",
            GridAction::Stop => "Stop",
            GridAction::Buy => "Buy",
            GridAction::Sell => "Sell",
        }
    }
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A grid connection point.
///
/// Buying imports `p_max`, selling exports `p_max`; there is no partial
/// position. Unlike the other kinds, `Aborted` is terminal here: no `Clear`
/// recovery, every further action self-loops with zero reward and zero
/// power.
#[derive(Debug, Clone)]
pub struct MainGrid {
    /// Stable identifier used in traces and reports.
    pub name: String,
    /// Exchange power while a buy or sell position is open.
    pub p_max: f32,
    max_allowed_power: f32,
    state: GridState,
    current_reward: f32,
    rng: StdRng,
}

impl MainGrid {
    /// Creates a grid connection in the `Stopped` state.
    ///
    /// # Errors
    ///
    /// Returns a config error if `max_allowed_power` is not strictly
    /// positive.
    pub fn new(
        name: impl Into<String>,
        p_max: f32,
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
        Ok(Self {
            name,
            p_max,
            max_allowed_power,
            state: GridState::Stopped,
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
    /// connection is left untouched in that case.
    pub fn step(&mut self, action: usize) -> Result<DeviceStep> {
        let Some(action) = GridAction::from_index(action) else {
            return Err(EnvError::InvalidAction {
                device: self.name.clone(),
                action,
                alphabet: GridAction::ALL.len(),
            });
        };

        let prev = self.state;
        self.apply(action);
        let reward = self.current_reward;
        let observation = self.observation();
        let done = self.state == GridState::Aborted;

        Ok(DeviceStep {
            observation,
            reward,
            done,
            trace: format!("{prev} => {action} => {}", self.state),
            cycle_completed: false,
        })
    }

    /// Returns the connection to `Stopped` and yields the initial
    /// observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.state = GridState::Stopped;
        self.current_reward = 0.0;
        self.observation()
    }

    /// Exchange power for the current position (negative when importing).
    pub fn current_power(&self) -> f32 {
        match self.state {
            GridState::Buying => -self.p_max,
            GridState::Selling => self.p_max,
            _ => 0.0,
        }
    }

    /// Current observation vector.
    pub fn observation(&self) -> Vec<f32> {
        state_observation(
            self.state.ordinal(),
            GridState::COUNT,
            self.current_power(),
            self.max_allowed_power,
        )
    }

    /// Draws a uniformly random action index from this connection's
    /// alphabet.
    pub fn sample_action(&mut self) -> usize {
        self.rng.random_range(0..GridAction::ALL.len())
    }

    /// Replaces the action-sampling RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Current state.
    pub fn state(&self) -> GridState {
        self.state
    }

    /// Reward computed for the most recent transition.
    pub fn current_reward(&self) -> f32 {
        self.current_reward
    }

    fn apply(&mut self, action: GridAction) {
        use GridAction as A;
        use GridState as S;

        match self.state {
            // Terminal: no Clear recovery for the grid connection.
            S::Aborted => self.current_reward = 0.0,
            S::Stopped => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Buy => {
                    self.state = S::Buying;
                    self.current_reward = 0.01;
                }
                A::Sell => {
                    self.state = S::Selling;
                    self.current_reward = 0.01;
                }
                _ => self.current_reward = 0.0,
            },
            S::Buying => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = -0.01;
                }
                A::Sell => {
                    self.state = S::Selling;
                    self.current_reward = 0.0;
                }
                // Holding an import position costs a little each tick.
                _ => self.current_reward = -0.01,
            },
            S::Selling => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = -0.01;
                }
                A::Buy => {
                    self.state = S::Buying;
                    self.current_reward = 0.0;
                }
                // Holding an export position earns a little each tick.
                _ => self.current_reward = 0.01,
            },
        }
    }
}
