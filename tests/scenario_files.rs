//! The checked-in scenario files must stay loadable and buildable.

use std::path::Path;

use eflex_sim::config::ScenarioConfig;

const SCENARIOS: &[&str] = &[
    "scenarios/demo.toml",
    "scenarios/duo.toml",
    "scenarios/tight_budget.toml",
];

#[test]
fn checked_in_scenarios_load_validate_and_build() {
    for path in SCENARIOS {
        let cfg = ScenarioConfig::from_toml_file(Path::new(path))
            .unwrap_or_else(|e| panic!("{path} should parse: {e}"));
        let errors = cfg.validate();
        assert!(errors.is_empty(), "{path} should validate: {errors:?}");
        assert!(cfg.build().is_ok(), "{path} should build a coordinator");
    }
}

#[test]
fn duo_file_matches_the_duo_preset() {
    let from_file = ScenarioConfig::from_toml_file(Path::new("scenarios/duo.toml"))
        .expect("duo.toml should parse");
    let preset = ScenarioConfig::duo();

    assert_eq!(from_file.simulation.ticks, preset.simulation.ticks);
    assert_eq!(from_file.simulation.seed, preset.simulation.seed);
    assert_eq!(
        from_file.environment.shared_reward,
        preset.environment.shared_reward
    );
    assert_eq!(from_file.devices.len(), preset.devices.len());
    for (a, b) in from_file.devices.iter().zip(&preset.devices) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.p_max, b.p_max);
    }
}
