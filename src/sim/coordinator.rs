//! Lockstep multi-device coordination: reward assembly, budget enforcement,
//! and the episode lifecycle.

use std::collections::BTreeSet;

use crate::devices::Device;
use crate::error::{EnvError, Result};
use crate::sim::profile::StepSeries;
use crate::sim::types::{EnvSettings, TickInfo, TickResult};

/// Penalty applied to every reward slot when a tick breaks the cost budget.
const BUDGET_PENALTY: f32 = 0.5;

/// Drives all registered devices one tick at a time.
///
/// Registration order is load-bearing: it fixes each device's position in
/// the observation and reward vectors and the order powers are summed.
/// Producers get their state reward blended with a production bonus before
/// any sharing; the budget check runs last and overrides everything.
#[derive(Debug, Clone)]
pub struct Coordinator {
    devices: Vec<Device>,
    settings: EnvSettings,
    price: StepSeries,
    load_limit: StepSeries,
    current_system_power: f32,
    global_reward: f32,
    production: u32,
    winners: BTreeSet<usize>,
    seed: u64,
    episode_ticks: usize,
    awaiting_reset: bool,
}

impl Coordinator {
    /// Assembles a coordinator over an ordered device registry.
    ///
    /// Applies `seed` immediately, deriving one decorrelated sampling stream
    /// per device from it.
    ///
    /// # Errors
    ///
    /// Returns a config error when the registry is empty, a device name
    /// repeats, or `max_allowed_power` is not strictly positive.
    pub fn new(
        devices: Vec<Device>,
        price: StepSeries,
        load_limit: StepSeries,
        settings: EnvSettings,
        seed: u64,
    ) -> Result<Self> {
        if devices.is_empty() {
            return Err(EnvError::config("devices", "at least one device is required"));
        }
        if settings.max_allowed_power <= 0.0 {
            return Err(EnvError::config(
                "environment.max_allowed_power",
                "must be strictly positive",
            ));
        }
        let mut names = BTreeSet::new();
        for device in &devices {
            if !names.insert(device.name()) {
                return Err(EnvError::config(
                    format!("devices.{}", device.name()),
                    "device names must be unique",
                ));
            }
        }
        let mut coordinator = Self {
            devices,
            settings,
            price,
            load_limit,
            current_system_power: 0.0,
            global_reward: 0.0,
            production: 0,
            winners: BTreeSet::new(),
            seed: 0,
            episode_ticks: 0,
            awaiting_reset: true,
        };
        coordinator.apply_seed(seed);
        Ok(coordinator)
    }

    /// Advances every device by one action and assembles the tick outcome.
    ///
    /// # Errors
    ///
    /// * [`EnvError::EpisodeState`] before the first `reset()`.
    /// * [`EnvError::ActionCount`] when the vector length does not match the
    ///   registry.
    /// * [`EnvError::InvalidAction`] from the offending device; devices
    ///   earlier in the order have already advanced at that point, so the
    ///   caller should reset before continuing.
    pub fn step(&mut self, actions: &[usize]) -> Result<TickResult> {
        if self.awaiting_reset {
            return Err(EnvError::EpisodeState(
                "step() called before reset()".to_string(),
            ));
        }
        if actions.len() != self.devices.len() {
            return Err(EnvError::ActionCount {
                expected: self.devices.len(),
                got: actions.len(),
            });
        }

        let energy_price = self.price.step();
        let load_limit = self.load_limit.step();

        let count = self.devices.len();
        let mut observations = Vec::with_capacity(count);
        let mut rewards = Vec::with_capacity(count);
        let mut transitions = Vec::with_capacity(count);
        let mut any_done = false;
        let mut system_power = 0.0;

        for (index, device) in self.devices.iter_mut().enumerate() {
            let outcome = device.step(actions[index])?;
            any_done |= outcome.done;
            transitions.push(outcome.trace);
            observations.push(outcome.observation);

            let mut reward = outcome.reward;
            if let Some(producer) = device.as_producer_mut() {
                // Half state reward, half production bonus; the blend is
                // what the producer reports from here on.
                let bonus = if outcome.cycle_completed { 1.0 } else { 0.0 };
                reward = 0.5 * reward + 0.5 * bonus;
                producer.set_reward(reward);
                if outcome.cycle_completed {
                    self.production += 1;
                }
            }
            rewards.push(reward);

            if device.reached_production_target() {
                self.winners.insert(index);
            }

            // Live read after the device advanced: ramping kinds already
            // show the next tick's draw here.
            system_power += device.current_power();
        }

        if self.settings.shared_reward {
            let total: f32 = rewards.iter().sum();
            rewards = vec![total; count];
        }

        self.current_system_power = system_power;
        let budget_violated =
            system_power * energy_price > self.settings.energy_cost_budget;
        let done = if budget_violated {
            for reward in &mut rewards {
                *reward -= BUDGET_PENALTY;
            }
            true
        } else {
            any_done
        };

        self.global_reward = rewards.iter().sum::<f32>() / count as f32;
        self.episode_ticks += 1;

        Ok(TickResult {
            observations,
            rewards,
            done,
            info: TickInfo {
                energy_price,
                load_limit,
                system_power,
                energy_cost_budget: self.settings.energy_cost_budget,
                budget_violated,
                production: self.production,
                transitions,
            },
        })
    }

    /// Starts a fresh episode and returns the initial observations.
    ///
    /// Devices and episode accumulators go back to their initial values;
    /// the price and load-limit calendars deliberately keep running.
    pub fn reset(&mut self) -> Vec<Vec<f32>> {
        self.price.reset();
        self.load_limit.reset();
        self.winners.clear();
        self.production = 0;
        self.global_reward = 0.0;
        self.current_system_power = 0.0;
        self.episode_ticks = 0;
        self.awaiting_reset = false;
        self.devices.iter_mut().map(Device::reset).collect()
    }

    /// Stores a new master seed and rederives every device's sampling
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::EpisodeState`] when called mid-episode; reseed
    /// before the first step or after a `reset()`.
    pub fn seed(&mut self, seed: u64) -> Result<u64> {
        if self.episode_ticks > 0 {
            return Err(EnvError::EpisodeState(
                "cannot reseed mid-episode; call reset() first".to_string(),
            ));
        }
        self.apply_seed(seed);
        Ok(seed)
    }

    /// Releases nothing: the environment holds no external resources. Kept
    /// for lifecycle symmetry with `reset()`/`seed()`.
    pub fn close(&mut self) {}

    /// Draws one random action per device from its own alphabet.
    pub fn sample_actions(&mut self) -> Vec<usize> {
        self.devices.iter_mut().map(Device::sample_action).collect()
    }

    /// One-line episode summary: the system power gauge, the winners set,
    /// and each device's state, reward, and production count.
    pub fn render(&self) -> String {
        let mut line = format!(
            "System power at {:.1}% of {:.1} kW | winners: {:?}",
            100.0 * self.current_system_power / self.settings.max_allowed_power,
            self.settings.max_allowed_power,
            self.winners,
        );
        for device in &self.devices {
            line.push_str(&format!(
                " | {} - State: {} - Reward: {:.3}",
                device.name(),
                device.state_name(),
                device.current_reward(),
            ));
            if let Some(count) = device.production_count() {
                line.push_str(&format!(" - PC: {count}"));
            }
        }
        line
    }

    /// Registered devices, in registration order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Indices of producers that have reached their production target this
    /// episode.
    pub fn winners(&self) -> &BTreeSet<usize> {
        &self.winners
    }

    /// Mean of the most recent tick's final reward vector.
    pub fn global_reward(&self) -> f32 {
        self.global_reward
    }

    /// System power summed over the most recent tick.
    pub fn current_system_power(&self) -> f32 {
        self.current_system_power
    }

    /// Production cycles completed so far this episode.
    pub fn production(&self) -> u32 {
        self.production
    }

    /// Master seed currently applied.
    pub fn applied_seed(&self) -> u64 {
        self.seed
    }

    /// Environment settings in force.
    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    fn apply_seed(&mut self, seed: u64) {
        self.seed = seed;
        for (index, device) in self.devices.iter_mut().enumerate() {
            device.reseed(seed.wrapping_add(index as u64));
        }
    }
}
