use std::fs;
use std::process::Command;

#[test]
fn cli_preset_run_is_deterministic() {
    let first = run_cli(&["--preset", "duo", "--seed", "7", "--ticks", "5"]);
    let second = run_cli(&["--preset", "duo", "--seed", "7", "--ticks", "5"]);

    assert_eq!(first, second, "same preset and seed should replay identically");
    assert!(first.contains("--- Episode Report ---"), "missing report: {first}");
    assert!(first.contains("t=  0"), "missing tick lines: {first}");
    assert!(first.contains("System power at"), "missing episode line: {first}");
}

#[test]
fn cli_rejects_unknown_preset() {
    let output = Command::new(env!("CARGO_BIN_EXE_eflex-sim"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("eflex-sim process should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "unexpected stderr: {stderr}");
}

#[test]
fn cli_writes_telemetry_csv() {
    let path = std::env::temp_dir().join(format!("eflex-sim-cli-{}.csv", std::process::id()));
    let path_str = path.to_str().expect("temp path is UTF-8");

    let output = Command::new(env!("CARGO_BIN_EXE_eflex-sim"))
        .args(["--preset", "duo", "--ticks", "3", "--telemetry-out", path_str])
        .output()
        .expect("eflex-sim process should run");
    assert!(
        output.status.success(),
        "telemetry run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let contents = fs::read_to_string(&path).expect("telemetry file should exist");
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some(
            "timestep,energy_price,load_limit_kw,system_power_kw,energy_cost,\
             total_reward,global_reward,production,budget_violated,done"
        )
    );
    assert!(lines.count() >= 1, "expected at least one data row");

    let _ = fs::remove_file(&path);
}

fn run_cli(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_eflex-sim"))
        .args(args)
        .output()
        .expect("eflex-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}
