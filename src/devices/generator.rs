//! Dispatchable generator with a per-tick ramp toward rated output.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::devices::types::{DeviceStep, state_observation};
use crate::error::{EnvError, Result};

/// States of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Stopped = 0,
    Aborted = 1,
    Generating = 2,
}

impl GeneratorState {
    /// Number of one-hot slots in the observation vector.
    pub const COUNT: usize = 3;

    /// All states in ordinal order.
    pub const ALL: [GeneratorState; 3] = [
        GeneratorState::Stopped,
        GeneratorState::Aborted,
        GeneratorState::Generating,
    ];

    /// Position of this state's one-hot slot.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Human-readable state name.
    pub fn name(self) -> &'static str {
        match self {
            GeneratorState::Stopped => "Stopped",
            GeneratorState::Aborted => "Aborted",
            GeneratorState::Generating => "Generating",
        }
    }
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action alphabet of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorAction {
    Sc = 0,
    Abort = 1,
    Clear = 2,
    Generate = 3,
    Stop = 4,
}

impl GeneratorAction {
    /// All actions in index order.
    pub const ALL: [GeneratorAction; 5] = [
        GeneratorAction::Sc,
        GeneratorAction::Abort,
        GeneratorAction::Clear,
        GeneratorAction::Generate,
        GeneratorAction::Stop,
    ];

    /// Decodes an integer action index; `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable action name.
    pub fn name(self) -> &'static str {
        match self {
            GeneratorAction::Sc => "SC",
            GeneratorAction::Abort => "Abort",
            GeneratorAction::Clear => "Clear",
            GeneratorAction::Generate => "Generate",
            GeneratorAction::Stop => "Stop",
        }
    }
}

impl fmt::Display for GeneratorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dispatchable generator.
///
/// While `Generating`, output ramps by `p_slope` per tick up to `p_max`
/// (export convention: power is non-positive) and each tick held in the
/// state earns `0.2 · |power| / p_max`. The ramp base is the previous
/// tick's output magnitude, so leaving the state restarts the ramp from
/// zero on re-entry.
#[derive(Debug, Clone)]
pub struct Generator {
    /// Stable identifier used in traces and reports.
    pub name: String,
    /// Rated output, the ramp ceiling.
    pub p_max: f32,
    /// Per-tick ramp increment.
    pub p_slope: f32,
    max_allowed_power: f32,
    state: GeneratorState,
    last_power: f32,
    current_reward: f32,
    rng: StdRng,
}

impl Generator {
    /// Creates a generator in the `Stopped` state.
    ///
    /// # Errors
    ///
    /// Returns a config error if `max_allowed_power` or `p_max` is not
    /// strictly positive (`p_max` scales the generating reward).
    pub fn new(
        name: impl Into<String>,
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
            p_max,
            p_slope,
            max_allowed_power,
            state: GeneratorState::Stopped,
            last_power: 0.0,
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
    /// generator is left untouched in that case.
    pub fn step(&mut self, action: usize) -> Result<DeviceStep> {
        let Some(action) = GeneratorAction::from_index(action) else {
            return Err(EnvError::InvalidAction {
                device: self.name.clone(),
                action,
                alphabet: GeneratorAction::ALL.len(),
            });
        };

        let prev = self.state;
        self.apply(action);
        let reward = self.current_reward;
        let observation = self.observation();
        let done = self.state == GeneratorState::Aborted;
        // The tick's output becomes the next ramp base; outside
        // `Generating` the output is zero, so the ramp restarts.
        self.last_power = self.current_power().abs();

        Ok(DeviceStep {
            observation,
            reward,
            done,
            trace: format!("{prev} => {action} => {}", self.state),
            cycle_completed: false,
        })
    }

    /// Returns the generator to `Stopped` with a cold ramp and yields the
    /// initial observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.state = GeneratorState::Stopped;
        self.last_power = 0.0;
        self.current_reward = 0.0;
        self.observation()
    }

    /// Output for the current state and ramp base (non-positive while
    /// generating).
    pub fn current_power(&self) -> f32 {
        match self.state {
            GeneratorState::Generating => -(self.last_power + self.p_slope).min(self.p_max),
            _ => 0.0,
        }
    }

    /// Current observation vector.
    pub fn observation(&self) -> Vec<f32> {
        state_observation(
            self.state.ordinal(),
            GeneratorState::COUNT,
            self.current_power(),
            self.max_allowed_power,
        )
    }

    /// Draws a uniformly random action index from this generator's alphabet.
    pub fn sample_action(&mut self) -> usize {
        self.rng.random_range(0..GeneratorAction::ALL.len())
    }

    /// Replaces the action-sampling RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Current state.
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Reward computed for the most recent transition.
    pub fn current_reward(&self) -> f32 {
        self.current_reward
    }

    fn apply(&mut self, action: GeneratorAction) {
        use GeneratorAction as A;
        use GeneratorState as S;

        match self.state {
            S::Stopped => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Generate => {
                    self.state = S::Generating;
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
            S::Generating => match action {
                A::Abort => {
                    self.state = S::Aborted;
                    self.current_reward = -0.1;
                }
                A::Stop => {
                    self.state = S::Stopped;
                    self.current_reward = 0.0;
                }
                // Holding the state earns in proportion to this tick's
                // ramped output.
                _ => self.current_reward = 0.2 * (self.current_power() / self.p_max).abs(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make() -> Generator {
        Generator::new("gen", 30.0, 10.0, 100.0, 7).unwrap()
    }

    fn make_at(state: GeneratorState, last_power: f32) -> Generator {
        let mut g = make();
        g.state = state;
        g.last_power = last_power;
        g
    }

    /// Documented transition table with the ramp base preset to 10.
    fn expected(state: GeneratorState, action: GeneratorAction) -> (GeneratorState, f32) {
        use GeneratorAction as A;
        use GeneratorState as S;

        let explicit: &[(A, S, f32)] = match state {
            S::Stopped => &[(A::Abort, S::Aborted, -0.1), (A::Generate, S::Generating, 0.1)],
            S::Aborted => &[(A::Clear, S::Stopped, 1.0)],
            S::Generating => &[(A::Abort, S::Aborted, -0.1), (A::Stop, S::Stopped, 0.0)],
        };

        // Generating self-loops earn on the tick's ramped output:
        // |-(10 + 10)| / 30 scaled by 0.2.
        let fallback = match state {
            S::Generating => 0.2 * (20.0_f32 / 30.0),
            _ => 0.0,
        };

        explicit
            .iter()
            .find(|(a, _, _)| *a == action)
            .map_or((state, fallback), |&(_, next, reward)| (next, reward))
    }

    #[test]
    fn transition_table_full_cartesian_product() {
        for &state in &GeneratorState::ALL {
            for (index, &action) in GeneratorAction::ALL.iter().enumerate() {
                let mut g = make_at(state, 10.0);
                let step = g.step(index).unwrap();
                let (want_state, want_reward) = expected(state, action);
                assert_eq!(g.state(), want_state, "{state} + {action}");
                assert!(
                    (step.reward - want_reward).abs() < 1e-6,
                    "{state} + {action}: {} vs {want_reward}",
                    step.reward
                );
            }
        }
    }

    #[test]
    fn rejects_non_positive_p_max() {
        let err = Generator::new("gen", 0.0, 10.0, 100.0, 7);
        assert!(matches!(err, Err(EnvError::Config { .. })));
    }

    #[test]
    fn output_ramps_to_rated_power() {
        let mut g = make();
        let mut observed = Vec::new();
        let s = g.step(GeneratorAction::Generate as usize).unwrap();
        observed.push(s.observation[4] * 100.0);
        for _ in 0..3 {
            let s = g.step(GeneratorAction::Sc as usize).unwrap();
            observed.push(s.observation[4] * 100.0);
        }
        assert_eq!(observed, vec![-10.0, -20.0, -30.0, -30.0]);
    }

    #[test]
    fn generating_reward_tracks_the_ramp() {
        let mut g = make();
        let s = g.step(GeneratorAction::Generate as usize).unwrap();
        assert_eq!(s.reward, 0.1);
        let s = g.step(GeneratorAction::Sc as usize).unwrap();
        assert!((s.reward - 0.2 * (20.0 / 30.0)).abs() < 1e-6);
        let s = g.step(GeneratorAction::Sc as usize).unwrap();
        assert!((s.reward - 0.2).abs() < 1e-6);
    }

    #[test]
    fn read_after_step_is_one_tick_ahead() {
        let mut g = make();
        let s = g.step(GeneratorAction::Generate as usize).unwrap();
        assert_eq!(s.observation[4] * 100.0, -10.0);
        assert_eq!(g.current_power(), -20.0);
    }

    #[test]
    fn leaving_generating_restarts_the_ramp() {
        let mut g = make();
        g.step(GeneratorAction::Generate as usize).unwrap();
        g.step(GeneratorAction::Sc as usize).unwrap();
        g.step(GeneratorAction::Stop as usize).unwrap();
        assert_eq!(g.current_power(), 0.0);
        let s = g.step(GeneratorAction::Generate as usize).unwrap();
        assert_eq!(s.observation[4] * 100.0, -10.0);
    }

    #[test]
    fn abort_clear_cycle_and_done() {
        let mut g = make_at(GeneratorState::Generating, 20.0);
        let s = g.step(GeneratorAction::Abort as usize).unwrap();
        assert_eq!(s.reward, -0.1);
        assert!(s.done);
        let s = g.step(GeneratorAction::Clear as usize).unwrap();
        assert_eq!(s.reward, 1.0);
        assert!(!s.done);
        assert_eq!(g.state(), GeneratorState::Stopped);
    }
}
