//! Production machine modeled on a PackML-style state machine.
//!
//! One transition table is shared by all producers; the configured
//! [`PowerCurve`] only changes how power draw evolves while the machine is
//! in an active production phase.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::devices::types::{DeviceStep, state_observation};
use crate::error::{EnvError, Result};

/// States of the production machine.
///
/// Ordinals index the observation vector directly. `LoadChange` is declared
/// for layout compatibility but no transition reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Stopped = 0,
    Aborted = 1,
    PowerOff = 2,
    LoadChange = 3,
    StandBy = 4,
    StartedUp = 5,
    Idle = 6,
    Execute = 7,
    Completed = 8,
    Held = 9,
    Suspended = 10,
}

impl ProducerState {
    /// Number of one-hot slots in the observation vector.
    pub const COUNT: usize = 11;

    /// All states in ordinal order.
    pub const ALL: [ProducerState; 11] = [
        ProducerState::Stopped,
        ProducerState::Aborted,
        ProducerState::PowerOff,
        ProducerState::LoadChange,
        ProducerState::StandBy,
        ProducerState::StartedUp,
        ProducerState::Idle,
        ProducerState::Execute,
        ProducerState::Completed,
        ProducerState::Held,
        ProducerState::Suspended,
    ];

    /// Position of this state's one-hot slot.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Human-readable state name.
    pub fn name(self) -> &'static str {
        match self {
            ProducerState::Stopped => "Stopped",
            ProducerState::Aborted => "Aborted",
            ProducerState::PowerOff => "PowerOff",
            ProducerState::LoadChange => "LoadChange",
            ProducerState::StandBy => "StandBy",
            ProducerState::StartedUp => "StartedUp",
            ProducerState::Idle => "Idle",
            ProducerState::Execute => "Execute",
            ProducerState::Completed => "Completed",
            ProducerState::Held => "Held",
            ProducerState::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for ProducerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action alphabet of the production machine, decoded from integer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerAction {
    Sc = 0,
    Abort = 1,
    Clear = 2,
    Reset = 3,
    Stop = 4,
    ChangeLoad = 5,
    Hold = 6,
    PowerOn = 7,
    PowerOff = 8,
    Standby = 9,
    Start = 10,
    Suspend = 11,
    UnHold = 12,
    Unsuspend = 13,
}

impl ProducerAction {
    /// All actions in index order.
    pub const ALL: [ProducerAction; 14] = [
        ProducerAction::Sc,
        ProducerAction::Abort,
        ProducerAction::Clear,
        ProducerAction::Reset,
        ProducerAction::Stop,
        ProducerAction::ChangeLoad,
        ProducerAction::Hold,
        ProducerAction::PowerOn,
        ProducerAction::PowerOff,
        ProducerAction::Standby,
        ProducerAction::Start,
        ProducerAction::Suspend,
        ProducerAction::UnHold,
        ProducerAction::Unsuspend,
    ];

    /// Decodes an integer action index; `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable action name.
    pub fn name(self) -> &'static str {
        match self {
            ProducerAction::Sc => "SC",
            ProducerAction::Abort => "Abort",
            ProducerAction::Clear => "Clear",
            ProducerAction::Reset => "Reset",
            ProducerAction::Stop => "Stop",
            ProducerAction::ChangeLoad => "ChangeLoad",
            ProducerAction::Hold => "Hold",
            ProducerAction::PowerOn => "PowerOn",
            ProducerAction::PowerOff => "PowerOff",
            ProducerAction::Standby => "Standby",
            ProducerAction::Start => "Start",
            ProducerAction::Suspend => "Suspend",
            ProducerAction::UnHold => "UnHold",
            ProducerAction::Unsuspend => "Unsuspend",
        }
    }
}

impl fmt::Display for ProducerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power draw shape while the machine is in `Execute` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCurve {
    /// Flat draw at `p_max`.
    Constant,
    /// Ramp from `p_min` by `p_slope` per tick, capped at `p_max`.
    Linear,
    /// Sigmoid ramp toward `p_max`. The growth rate is fixed by `p_max`
    /// itself; `p_slope` is accepted but does not enter the formula.
    Logistic,
}

/// A production machine driven through its state machine one action per tick.
///
/// The nominal cycle is `Stopped -> Idle -> Execute -> Completed -> Idle`,
/// with `Hold`/`Suspend`/`Standby`/`PowerOff` side branches that drop the
/// power draw to `p_min` without ending the ramp phase. Completing
/// `Execute -> Completed` increments the production counter; reaching the
/// production target makes the device report `done` from that tick on.
///
/// Power is computed live from the current state and tick counters, so a
/// ramping machine read after `step()` returns already shows the next tick's
/// draw while the observation captured the in-step value.
#[derive(Debug, Clone)]
pub struct Producer {
    /// Stable identifier used in traces and reports.
    pub name: String,
    /// Power draw outside active production and the ramp floor.
    pub p_min: f32,
    /// Peak power draw and ramp ceiling.
    pub p_max: f32,
    /// Per-tick ramp increment (linear curve only, see [`PowerCurve`]).
    pub p_slope: f32,
    curve: PowerCurve,
    max_allowed_power: f32,
    production_target: u32,
    state: ProducerState,
    current_reward: f32,
    production_count: u32,
    current_step: usize,
    start_step: usize,
    rng: StdRng,
}

impl Producer {
    /// Creates a production machine in the `Stopped` state.
    ///
    /// # Arguments
    ///
    /// * `name` - Stable device identifier
    /// * `curve` - Power draw shape during active production
    /// * `p_min` - Idle/side-branch power draw and ramp floor
    /// * `p_max` - Peak power draw and ramp ceiling
    /// * `p_slope` - Per-tick ramp increment for the linear curve
    /// * `max_allowed_power` - Observation power-fraction denominator
    /// * `production_target` - Cycles required to count as a winner
    /// * `seed` - Seed for the action-sampling RNG
    ///
    /// # Errors
    ///
    /// Returns a config error if `max_allowed_power` is not strictly
    /// positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        curve: PowerCurve,
        p_min: f32,
        p_max: f32,
        p_slope: f32,
        max_allowed_power: f32,
        production_target: u32,
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
            p_min,
            p_max,
            p_slope,
            curve,
            max_allowed_power,
            production_target,
            state: ProducerState::Stopped,
            current_reward: 0.0,
            production_count: 0,
            current_step: 0,
            start_step: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Applies one action, returning the observation, reward, done flag, and
    /// transition trace for this tick.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidAction`] for an out-of-range index; the
    /// machine is left untouched in that case.
    pub fn step(&mut self, action: usize) -> Result<DeviceStep> {
        let Some(action) = ProducerAction::from_index(action) else {
            return Err(EnvError::InvalidAction {
                device: self.name.clone(),
                action,
                alphabet: ProducerAction::ALL.len(),
            });
        };

        let prev = self.state;
        self.apply(action);
        let reward = self.current_reward;
        let observation = self.observation();
        let done = self.is_done();
        self.current_step += 1;

        Ok(DeviceStep {
            observation,
            reward,
            done,
            trace: format!("{prev} => {action} => {}", self.state),
            cycle_completed: prev == ProducerState::Execute
                && self.state == ProducerState::Completed,
        })
    }

    /// Returns the machine to `Stopped` with cleared counters and yields the
    /// initial observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.state = ProducerState::Stopped;
        self.current_reward = 0.0;
        self.production_count = 0;
        self.current_step = 0;
        self.start_step = 0;
        self.observation()
    }

    /// Power draw for the current state and ramp phase.
    ///
    /// Pure with respect to the stored counters: repeated calls without an
    /// intervening `step()` return the same value.
    pub fn current_power(&self) -> f32 {
        match self.state {
            ProducerState::Aborted | ProducerState::Stopped => 0.0,
            ProducerState::Execute | ProducerState::Completed => {
                let delta = (self.current_step - self.start_step) as f32;
                match self.curve {
                    PowerCurve::Constant => self.p_max,
                    PowerCurve::Linear => (self.p_min + delta * self.p_slope).min(self.p_max),
                    PowerCurve::Logistic => {
                        let sigmoid = self.p_max / (1.0 + (-self.p_max * delta).exp());
                        (self.p_min + sigmoid).min(self.p_max)
                    }
                }
            }
            _ => self.p_min,
        }
    }

    /// Current observation vector.
    pub fn observation(&self) -> Vec<f32> {
        state_observation(
            self.state.ordinal(),
            ProducerState::COUNT,
            self.current_power(),
            self.max_allowed_power,
        )
    }

    /// Draws a uniformly random action index from this machine's alphabet.
    pub fn sample_action(&mut self) -> usize {
        self.rng.random_range(0..ProducerAction::ALL.len())
    }

    /// Replaces the action-sampling RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Current state.
    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// Reward computed for the most recent transition (or written back by
    /// the coordinator's production blend).
    pub fn current_reward(&self) -> f32 {
        self.current_reward
    }

    /// Completed production cycles this episode.
    pub fn production_count(&self) -> u32 {
        self.production_count
    }

    /// Configured power curve.
    pub fn curve(&self) -> PowerCurve {
        self.curve
    }

    /// True once the production counter has reached the configured target.
    pub fn reached_production_target(&self) -> bool {
        self.production_count >= self.production_target
    }

    pub(crate) fn set_reward(&mut self, reward: f32) {
        self.current_reward = reward;
    }

    fn is_done(&self) -> bool {
        self.state == ProducerState::Aborted || self.production_count >= self.production_target
    }

    fn apply(&mut self, action: ProducerAction) {
        use ProducerAction as A;
        use ProducerState as S;

        match self.state {
            S::Stopped => {
                self.start_step = self.current_step;
                match action {
                    A::Abort => {
                        self.state = S::Aborted;
                        self.current_reward = -0.1;
                    }
                    A::Reset => {
                        self.state = S::Idle;
                        self.current_reward = 0.1;
                    }
                    _ => self.current_reward = 0.0,
                }
            }
            S::Aborted => {
                self.start_step = self.current_step;
                match action {
                    A::Clear => {
                        self.state = S::Stopped;
                        self.current_reward = 1.0;
                    }
                    _ => self.current_reward = 0.0,
                }
            }
            S::PowerOff => {
                self.start_step = self.current_step;
                match action {
                    A::Abort => {
                        self.state = S::Aborted;
                        self.current_reward = -0.1;
                    }
                    A::PowerOn => {
                        self.state = S::StartedUp;
                        self.current_reward = 0.0;
                    }
                    A::Stop => {
                        self.state = S::Stopped;
                        self.current_reward = 0.0;
                    }
                    _ => self.current_reward = 0.0,
                }
            }
            // Unreachable by construction; responds like any other
            // self-loop so the table stays total.
            S::LoadChange => self.current_reward = 0.0,
            S::StandBy => {
                self.start_step = self.current_step;
                match action {
                    A::Abort => {
                        self.state = S::Aborted;
                        self.current_reward = -0.1;
                    }
                    A::PowerOn => {
                        self.state = S::StartedUp;
                        self.current_reward = 0.1;
                    }
                    A::Stop => {
                        self.state = S::Stopped;
                        self.current_reward = 0.0;
                    }
                    _ => self.current_reward = 0.0,
                }
            }
            S::StartedUp => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Reset => {
                    self.state = S::Idle;
                    self.current_reward = 0.3;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                _ => self.current_reward = 0.0,
            },
            S::Idle => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Start => {
                    // The ramp phase begins here; side branches below do
                    // not restart it.
                    self.start_step = self.current_step;
                    self.state = S::Execute;
                    self.current_reward = 1.0;
                }
                A::PowerOff => {
                    self.state = S::PowerOff;
                    self.current_reward = 0.0;
                }
                A::Standby => {
                    self.state = S::StandBy;
                    self.current_reward = 0.0;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                A::ChangeLoad => self.current_reward = 0.1,
                _ => self.current_reward = 0.0,
            },
            S::Execute => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Sc => {
                    self.state = S::Completed;
                    self.current_reward = 1.0;
                    self.production_count += 1;
                }
                A::Hold => {
                    self.state = S::Held;
                    self.current_reward = 0.0;
                }
                A::Suspend => {
                    self.state = S::Suspended;
                    self.current_reward = 0.0;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                A::ChangeLoad => self.current_reward = 0.0,
                _ => self.current_reward = 0.0,
            },
            S::Completed => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Sc => {
                    self.state = S::Idle;
                    self.current_reward = 1.0;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                _ => self.current_reward = 0.0,
            },
            S::Held => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::UnHold => {
                    self.state = S::Execute;
                    self.current_reward = 0.1;
                }
                A::Suspend => {
                    self.state = S::Suspended;
                    self.current_reward = 0.0;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                A::ChangeLoad => self.current_reward = 0.0,
                _ => self.current_reward = 0.0,
            },
            S::Suspended => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Unsuspend => {
                    self.state = S::Execute;
                    self.current_reward = 0.1;
                }
                A::Hold => {
                    self.state = S::Held;
                    self.current_reward = 0.0;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                A::ChangeLoad => self.current_reward = 0.0,
                _ => self.current_reward = 0.0,
            },
        }
    }
}
