//! TOML-based scenario configuration, presets, and the device factory.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::devices::{
    DEFAULT_PRODUCTION_TARGET, Device, EnergyStorage, Generator, MainGrid, PowerCurve, Producer,
};
use crate::error::{EnvError, Result};
use crate::sim::coordinator::Coordinator;
use crate::sim::profile::StepSeries;
use crate::sim::types::EnvSettings;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the `demo` preset; the device list
/// defaults to empty and must be filled for the scenario to validate. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or use a named preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Episode length and seeding.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Coordinator-level settings and the price/load profiles.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Ordered device registry; array order fixes registration order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Episode length and seeding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Tick cap for one demo episode (must be > 0).
    pub ticks: usize,
    /// Master random seed for action sampling.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { ticks: 96, seed: 42 }
    }
}

/// Coordinator-level settings and the price/load profiles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Observation power-fraction denominator (kW, must be > 0).
    pub max_allowed_power: f32,
    /// Cap on `system power x price` per tick.
    pub energy_cost_budget: f32,
    /// Broadcast the summed reward vector to every device.
    pub shared_reward: bool,
    /// Production cycles a producer needs to count as a winner (must be > 0).
    pub production_target: u32,
    /// Time-of-use energy price profile.
    pub tou: SeriesConfig,
    /// Load-limit profile with its tolerance widening.
    pub load_profile: LoadSeriesConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_allowed_power: 200.0,
            energy_cost_budget: 10_000.0,
            shared_reward: false,
            production_target: DEFAULT_PRODUCTION_TARGET,
            tou: SeriesConfig::default(),
            load_profile: LoadSeriesConfig::default(),
        }
    }
}

/// Breakpoints and values of a piecewise-constant profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesConfig {
    /// Tick breakpoints, strictly ascending.
    pub steps: Vec<usize>,
    /// Value in force once the matching breakpoint is passed.
    pub values: Vec<f32>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            steps: vec![32, 64, 80],
            values: vec![0.12, 0.35, 0.20],
        }
    }
}

/// Load-limit profile plus tolerance widening.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadSeriesConfig {
    /// Tick breakpoints, strictly ascending.
    pub steps: Vec<usize>,
    /// Limit in force once the matching breakpoint is passed (kW).
    pub values: Vec<f32>,
    /// Every limit is widened by `1 + tolerance_factor` (must be >= 0).
    pub tolerance_factor: f32,
}

impl Default for LoadSeriesConfig {
    fn default() -> Self {
        Self {
            steps: vec![48, 96],
            values: vec![150.0, 120.0],
            tolerance_factor: 0.1,
        }
    }
}

/// One device entry of the scenario registry.
///
/// `name` and `kind` are required; the power parameters default to zero and
/// are interpreted per kind (a grid connection ignores `p_min`/`p_slope`,
/// for instance).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Stable device identifier, unique within the scenario.
    pub name: String,
    /// Device kind tag, one of [`DeviceConfig::KINDS`].
    pub kind: String,
    /// Idle draw / ramp floor / lowest charge level (kW).
    #[serde(default)]
    pub p_min: f32,
    /// Peak draw / rated output / highest charge level (kW).
    #[serde(default)]
    pub p_max: f32,
    /// Ramp increment or charge rate per tick (kW).
    #[serde(default)]
    pub p_slope: f32,
}

impl DeviceConfig {
    /// Recognized device kind tags.
    pub const KINDS: &[&str] = &[
        "constant_producer",
        "linear_producer",
        "logistic_producer",
        "energy_storage",
        "generator",
        "main_grid",
    ];
}

impl ScenarioConfig {
    /// Returns the demo scenario: one device of every kind under the
    /// default profiles.
    pub fn demo() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            environment: EnvironmentConfig::default(),
            devices: vec![
                DeviceConfig {
                    name: "m_const".to_string(),
                    kind: "constant_producer".to_string(),
                    p_min: 5.0,
                    p_max: 30.0,
                    p_slope: 0.0,
                },
                DeviceConfig {
                    name: "m_linear".to_string(),
                    kind: "linear_producer".to_string(),
                    p_min: 5.0,
                    p_max: 40.0,
                    p_slope: 5.0,
                },
                DeviceConfig {
                    name: "m_logistic".to_string(),
                    kind: "logistic_producer".to_string(),
                    p_min: 5.0,
                    p_max: 35.0,
                    p_slope: 3.0,
                },
                DeviceConfig {
                    name: "store".to_string(),
                    kind: "energy_storage".to_string(),
                    p_min: 0.0,
                    p_max: 50.0,
                    p_slope: 10.0,
                },
                DeviceConfig {
                    name: "gen".to_string(),
                    kind: "generator".to_string(),
                    p_min: 0.0,
                    p_max: 40.0,
                    p_slope: 8.0,
                },
                DeviceConfig {
                    name: "grid".to_string(),
                    kind: "main_grid".to_string(),
                    p_min: 0.0,
                    p_max: 60.0,
                    p_slope: 0.0,
                },
            ],
        }
    }

    /// Returns the duo preset: one linear producer against the grid with
    /// shared rewards and a tighter budget.
    pub fn duo() -> Self {
        Self {
            simulation: SimulationConfig {
                ticks: 48,
                ..SimulationConfig::default()
            },
            environment: EnvironmentConfig {
                max_allowed_power: 100.0,
                energy_cost_budget: 5_000.0,
                shared_reward: true,
                ..EnvironmentConfig::default()
            },
            devices: vec![
                DeviceConfig {
                    name: "m1".to_string(),
                    kind: "linear_producer".to_string(),
                    p_min: 5.0,
                    p_max: 40.0,
                    p_slope: 5.0,
                },
                DeviceConfig {
                    name: "grid".to_string(),
                    kind: "main_grid".to_string(),
                    p_min: 0.0,
                    p_max: 60.0,
                    p_slope: 0.0,
                },
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "duo"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a config error if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "demo" => Ok(Self::demo()),
            "duo" => Ok(Self::duo()),
            _ => Err(EnvError::config(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EnvError::config("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a config error if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EnvError::config("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<EnvError> {
        let mut errors = Vec::new();

        if self.simulation.ticks == 0 {
            errors.push(EnvError::config("simulation.ticks", "must be > 0"));
        }

        let env = &self.environment;
        if env.max_allowed_power <= 0.0 {
            errors.push(EnvError::config(
                "environment.max_allowed_power",
                "must be strictly positive",
            ));
        }
        if env.production_target == 0 {
            errors.push(EnvError::config(
                "environment.production_target",
                "must be at least 1",
            ));
        }
        if env.load_profile.tolerance_factor < 0.0 {
            errors.push(EnvError::config(
                "environment.load_profile.tolerance_factor",
                "must not be negative",
            ));
        }
        check_series(&mut errors, "environment.tou", &env.tou.steps, &env.tou.values);
        check_series(
            &mut errors,
            "environment.load_profile",
            &env.load_profile.steps,
            &env.load_profile.values,
        );

        if self.devices.is_empty() {
            errors.push(EnvError::config("devices", "at least one device is required"));
        }
        let mut seen = BTreeSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                errors.push(EnvError::config("devices.name", "must not be empty"));
            } else if !seen.insert(device.name.as_str()) {
                errors.push(EnvError::config(
                    format!("devices.{}", device.name),
                    "device names must be unique",
                ));
            }
            if !DeviceConfig::KINDS.contains(&device.kind.as_str()) {
                errors.push(EnvError::config(
                    format!("devices.{}.kind", device.name),
                    format!(
                        "unknown device kind \"{}\", available: {}",
                        device.kind,
                        DeviceConfig::KINDS.join(", ")
                    ),
                ));
            }
            match device.kind.as_str() {
                "energy_storage" | "generator" => {
                    if device.p_max <= 0.0 {
                        errors.push(EnvError::config(
                            format!("devices.{}.p_max", device.name),
                            "must be strictly positive",
                        ));
                    }
                }
                _ => {}
            }
        }

        errors
    }

    /// Builds the coordinator described by this scenario.
    ///
    /// Device array order becomes registration order; every device gets the
    /// environment's `max_allowed_power` and, for producers, its
    /// `production_target`.
    ///
    /// # Errors
    ///
    /// Returns the first construction error (unknown kind, bad series
    /// shape, non-positive power limits).
    pub fn build(&self) -> Result<Coordinator> {
        let env = &self.environment;
        let settings = EnvSettings {
            max_allowed_power: env.max_allowed_power,
            energy_cost_budget: env.energy_cost_budget,
            shared_reward: env.shared_reward,
            production_target: env.production_target,
        };
        let seed = self.simulation.seed;

        let mut devices = Vec::with_capacity(self.devices.len());
        for (index, entry) in self.devices.iter().enumerate() {
            let device_seed = seed.wrapping_add(index as u64);
            let device = match entry.kind.as_str() {
                "constant_producer" => Device::Producer(Producer::new(
                    &entry.name,
                    PowerCurve::Constant,
                    entry.p_min,
                    entry.p_max,
                    entry.p_slope,
                    env.max_allowed_power,
                    env.production_target,
                    device_seed,
                )?),
                "linear_producer" => Device::Producer(Producer::new(
                    &entry.name,
                    PowerCurve::Linear,
                    entry.p_min,
                    entry.p_max,
                    entry.p_slope,
                    env.max_allowed_power,
                    env.production_target,
                    device_seed,
                )?),
                "logistic_producer" => Device::Producer(Producer::new(
                    &entry.name,
                    PowerCurve::Logistic,
                    entry.p_min,
                    entry.p_max,
                    entry.p_slope,
                    env.max_allowed_power,
                    env.production_target,
                    device_seed,
                )?),
                "energy_storage" => Device::Storage(EnergyStorage::new(
                    &entry.name,
                    entry.p_min,
                    entry.p_max,
                    entry.p_slope,
                    env.max_allowed_power,
                    device_seed,
                )?),
                "generator" => Device::Generator(Generator::new(
                    &entry.name,
                    entry.p_max,
                    entry.p_slope,
                    env.max_allowed_power,
                    device_seed,
                )?),
                "main_grid" => Device::Grid(MainGrid::new(
                    &entry.name,
                    entry.p_max,
                    env.max_allowed_power,
                    device_seed,
                )?),
                other => {
                    return Err(EnvError::config(
                        format!("devices.{}.kind", entry.name),
                        format!("unknown device kind \"{other}\""),
                    ));
                }
            };
            devices.push(device);
        }

        let price = StepSeries::new(
            "environment.tou",
            env.tou.steps.clone(),
            env.tou.values.clone(),
        )?;
        let load_limit = StepSeries::with_tolerance(
            "environment.load_profile",
            env.load_profile.steps.clone(),
            env.load_profile.values.clone(),
            env.load_profile.tolerance_factor,
        )?;

        Coordinator::new(devices, price, load_limit, settings, seed)
    }
}

fn check_series(errors: &mut Vec<EnvError>, prefix: &str, steps: &[usize], values: &[f32]) {
    if steps.is_empty() || values.is_empty() {
        errors.push(EnvError::config(
            format!("{prefix}.steps"),
            "steps and values must not be empty",
        ));
        return;
    }
    if steps.len() != values.len() {
        errors.push(EnvError::config(
            format!("{prefix}.steps"),
            "steps and values must have the same length",
        ));
    }
    if steps.windows(2).any(|w| w[1] <= w[0]) {
        errors.push(EnvError::config(
            format!("{prefix}.steps"),
            "breakpoints must be strictly ascending",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_preset_valid() {
        let cfg = ScenarioConfig::demo();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "demo should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid_and_build() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap();
            let errors = cfg.validate();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
            assert!(cfg.build().is_ok(), "preset \"{name}\" should build");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown preset"));
        assert!(msg.contains("demo"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
ticks = 48
seed = 99

[environment]
max_allowed_power = 120.0
energy_cost_budget = 4000.0
shared_reward = true
production_target = 5

[environment.tou]
steps = [12, 24]
values = [0.1, 0.4]

[environment.load_profile]
steps = [24, 48]
values = [90.0, 70.0]
tolerance_factor = 0.2

[[devices]]
name = "m1"
kind = "linear_producer"
p_min = 5.0
p_max = 40.0
p_slope = 5.0

[[devices]]
name = "grid"
kind = "main_grid"
p_max = 60.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.ticks, 48);
        assert_eq!(cfg.simulation.seed, 99);
        assert!(cfg.environment.shared_reward);
        assert_eq!(cfg.environment.production_target, 5);
        assert_eq!(cfg.devices.len(), 2);
        assert_eq!(cfg.devices[0].name, "m1");
        assert_eq!(cfg.devices[1].kind, "main_grid");
        // Omitted numeric fields default to zero.
        assert_eq!(cfg.devices[1].p_slope, 0.0);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
ticks = 24
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.seed, 99);
        assert_eq!(cfg.simulation.ticks, 96);
        assert_eq!(cfg.environment.max_allowed_power, 200.0);
        assert!(cfg.devices.is_empty());
    }

    #[test]
    fn validation_catches_zero_ticks() {
        let mut cfg = ScenarioConfig::demo();
        cfg.simulation.ticks = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "simulation.ticks"));
    }

    #[test]
    fn validation_catches_empty_registry() {
        let mut cfg = ScenarioConfig::demo();
        cfg.devices.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "devices"));
    }

    #[test]
    fn validation_catches_duplicate_names() {
        let mut cfg = ScenarioConfig::demo();
        cfg.devices[1].name = cfg.devices[0].name.clone();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "devices.m_const"));
    }

    #[test]
    fn validation_catches_unknown_kind() {
        let mut cfg = ScenarioConfig::demo();
        cfg.devices[0].kind = "wind_turbine".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "devices.m_const.kind"));
    }

    #[test]
    fn validation_catches_bad_storage_p_max() {
        let mut cfg = ScenarioConfig::demo();
        cfg.devices[3].p_max = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "devices.store.p_max"));
    }

    #[test]
    fn validation_catches_unsorted_breakpoints() {
        let mut cfg = ScenarioConfig::demo();
        cfg.environment.tou.steps = vec![64, 32];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| field_of(e) == "environment.tou.steps"));
    }

    #[test]
    fn validation_catches_negative_tolerance() {
        let mut cfg = ScenarioConfig::demo();
        cfg.environment.load_profile.tolerance_factor = -0.5;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| field_of(e) == "environment.load_profile.tolerance_factor")
        );
    }

    #[test]
    fn build_demo_registers_every_kind_in_order() {
        let coordinator = ScenarioConfig::demo().build().unwrap();
        let kinds: Vec<_> = coordinator.devices().iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "constant_producer",
                "linear_producer",
                "logistic_producer",
                "energy_storage",
                "generator",
                "main_grid",
            ]
        );
        assert_eq!(coordinator.applied_seed(), 42);
        assert_eq!(coordinator.settings().max_allowed_power, 200.0);
    }

    #[test]
    fn build_rejects_unknown_kind() {
        let mut cfg = ScenarioConfig::demo();
        cfg.devices[0].kind = "wind_turbine".to_string();
        let err = cfg.build().unwrap_err();
        assert!(err.to_string().contains("unknown device kind"));
    }

    fn field_of(error: &EnvError) -> &str {
        match error {
            EnvError::Config { field, .. } => field,
            _ => "",
        }
    }
}
