//! Shared test fixtures for integration tests.

use eflex_sim::config::ScenarioConfig;
use eflex_sim::devices::{Device, PowerCurve, Producer};
use eflex_sim::sim::coordinator::Coordinator;
use eflex_sim::sim::profile::StepSeries;
use eflex_sim::sim::types::EnvSettings;

/// The demo scenario coordinator: one device of every kind, seed 42.
pub fn demo_coordinator() -> Coordinator {
    ScenarioConfig::demo().build().expect("demo preset should build")
}

/// The duo scenario coordinator: linear producer plus grid, shared reward.
pub fn duo_coordinator() -> Coordinator {
    ScenarioConfig::duo().build().expect("duo preset should build")
}

/// A flat single-value series (one breakpoint that never changes anything).
pub fn flat_series(value: f32) -> StepSeries {
    StepSeries::new("flat", vec![1], vec![value]).expect("flat series is well-formed")
}

/// A coordinator holding one constant producer with the given production
/// target, flat price 1.0, and a generous budget.
pub fn producer_coordinator(target: u32) -> Coordinator {
    let producer = Device::Producer(
        Producer::new("m1", PowerCurve::Constant, 0.0, 30.0, 0.0, 200.0, target, 0)
            .expect("producer params are valid"),
    );
    let settings = EnvSettings {
        max_allowed_power: 200.0,
        energy_cost_budget: 100_000.0,
        shared_reward: false,
        production_target: target,
    };
    Coordinator::new(vec![producer], flat_series(1.0), flat_series(150.0), settings, 42)
        .expect("single-producer coordinator should build")
}

/// A tight-budget scenario: one constant producer whose first Execute tick
/// breaks the budget at flat price 1.0.
pub fn tight_budget_config() -> ScenarioConfig {
    let toml = r#"
[simulation]
ticks = 16
seed = 7

[environment]
max_allowed_power = 100.0
energy_cost_budget = 10.0

[environment.tou]
steps = [1]
values = [1.0]

[environment.load_profile]
steps = [1]
values = [80.0]
tolerance_factor = 0.0

[[devices]]
name = "m1"
kind = "constant_producer"
p_min = 0.0
p_max = 30.0
"#;
    ScenarioConfig::from_toml_str(toml).expect("tight-budget TOML should parse")
}
