//! Core environment types: settings, per-tick payloads, and telemetry
//! records.

use std::fmt;

use crate::devices::DEFAULT_PRODUCTION_TARGET;

/// Environment-level settings shared by the coordinator and every device.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    /// Denominator for observation power fractions and the render gauge
    /// (must be > 0).
    pub max_allowed_power: f32,
    /// Cap on `system power x price` per tick; exceeding it ends the
    /// episode with a penalty.
    pub energy_cost_budget: f32,
    /// When true, every device receives the summed reward vector instead of
    /// its own slot.
    pub shared_reward: bool,
    /// Production cycles a producer needs to join the winners set.
    pub production_target: u32,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            max_allowed_power: 200.0,
            energy_cost_budget: 10_000.0,
            shared_reward: false,
            production_target: DEFAULT_PRODUCTION_TARGET,
        }
    }
}

/// Side information published with every tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Energy price in force this tick.
    pub energy_price: f32,
    /// Load-limit profile value in force this tick (kW).
    pub load_limit: f32,
    /// Sum of all device powers after the tick (kW).
    pub system_power: f32,
    /// Configured energy cost budget.
    pub energy_cost_budget: f32,
    /// True when this tick breached the budget.
    pub budget_violated: bool,
    /// Production cycles completed so far this episode.
    pub production: u32,
    /// One `"<prev> => <action> => <next>"` trace per device, in
    /// registration order.
    pub transitions: Vec<String>,
}

/// Everything a controller gets back from one coordinated tick.
#[derive(Debug, Clone)]
pub struct TickResult {
    /// Per-device observations, in registration order.
    pub observations: Vec<Vec<f32>>,
    /// Per-device rewards after blending, sharing, and penalties.
    pub rewards: Vec<f32>,
    /// True when any device finished or the budget was breached.
    pub done: bool,
    /// Side information for this tick.
    pub info: TickInfo,
}

/// Flat telemetry record of one tick, suitable for printing and CSV export.
#[derive(Debug, Clone)]
pub struct TickRecord {
    /// Tick index within the episode, starting at 0.
    pub timestep: usize,
    /// Energy price in force.
    pub energy_price: f32,
    /// Load-limit profile value in force (kW).
    pub load_limit: f32,
    /// System power after the tick (kW).
    pub system_power: f32,
    /// `system_power x energy_price` for the tick.
    pub energy_cost: f32,
    /// Sum of the tick's reward vector.
    pub total_reward: f32,
    /// Mean of the tick's reward vector.
    pub global_reward: f32,
    /// Production cycles completed so far this episode.
    pub production: u32,
    /// True when this tick breached the budget.
    pub budget_violated: bool,
    /// True when this tick ended the episode.
    pub done: bool,
}

impl TickRecord {
    /// Flattens one tick outcome into a record.
    pub fn from_tick(timestep: usize, tick: &TickResult) -> Self {
        let total_reward: f32 = tick.rewards.iter().sum();
        let global_reward = if tick.rewards.is_empty() {
            0.0
        } else {
            total_reward / tick.rewards.len() as f32
        };
        Self {
            timestep,
            energy_price: tick.info.energy_price,
            load_limit: tick.info.load_limit,
            system_power: tick.info.system_power,
            energy_cost: tick.info.system_power * tick.info.energy_price,
            total_reward,
            global_reward,
            production: tick.info.production,
            budget_violated: tick.info.budget_violated,
            done: tick.done,
        }
    }
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} | price={:>6.3}  limit={:>7.2} kW | power={:>7.2} kW  \
             cost={:>8.2} | reward={:>7.3}  global={:>7.3} | produced={:>3}  \
             over_budget={}  done={}",
            self.timestep,
            self.energy_price,
            self.load_limit,
            self.system_power,
            self.energy_cost,
            self.total_reward,
            self.global_reward,
            self.production,
            self.budget_violated,
            self.done,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> TickResult {
        TickResult {
            observations: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            rewards: vec![0.5, -0.1],
            done: false,
            info: TickInfo {
                energy_price: 0.25,
                load_limit: 150.0,
                system_power: 40.0,
                energy_cost_budget: 10_000.0,
                budget_violated: false,
                production: 3,
                transitions: vec![String::new(), String::new()],
            },
        }
    }

    #[test]
    fn record_flattens_tick_math() {
        let r = TickRecord::from_tick(7, &tick());
        assert_eq!(r.timestep, 7);
        assert!((r.total_reward - 0.4).abs() < 1e-6);
        assert!((r.global_reward - 0.2).abs() < 1e-6);
        assert!((r.energy_cost - 10.0).abs() < 1e-6);
        assert_eq!(r.production, 3);
        assert!(!r.budget_violated);
    }

    #[test]
    fn record_display_does_not_panic() {
        let r = TickRecord::from_tick(0, &tick());
        let s = format!("{r}");
        assert!(!s.is_empty());
        assert!(s.starts_with("t="));
    }

    #[test]
    fn default_settings_carry_the_production_target() {
        let s = EnvSettings::default();
        assert_eq!(s.production_target, DEFAULT_PRODUCTION_TARGET);
        assert!(s.max_allowed_power > 0.0);
    }
}
