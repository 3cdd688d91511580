//! Environment entry point — CLI wiring and a random-policy rollout.

use std::path::Path;
use std::process;

use eflex_sim::config::ScenarioConfig;
use eflex_sim::error::Result;
use eflex_sim::io::export::export_csv;
use eflex_sim::sim::coordinator::Coordinator;
use eflex_sim::sim::report::EpisodeReport;
use eflex_sim::sim::types::TickRecord;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    ticks_override: Option<usize>,
    trace: bool,
    telemetry_out: Option<String>,
}

fn print_help() {
    eprintln!("eflex-sim — multi-agent industrial energy-flexibility environment");
    eprintln!();
    eprintln!("Usage: eflex-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (demo, duo)");
    eprintln!("  --seed <u64>             Override the random seed");
    eprintln!("  --ticks <n>              Override the episode tick cap");
    eprintln!("  --trace                  Print per-device transition traces");
    eprintln!("  --telemetry-out <path>   Export tick records to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the demo preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        ticks_override: None,
        trace: false,
        telemetry_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--ticks" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --ticks requires a number argument");
                    process::exit(1);
                }
                if let Ok(t) = args[i].parse::<usize>() {
                    cli.ticks_override = Some(t);
                } else {
                    eprintln!("error: --ticks value \"{}\" is not a valid number", args[i]);
                    process::exit(1);
                }
            }
            "--trace" => {
                cli.trace = true;
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Rolls one random-policy episode, printing each record as it happens.
///
/// Stops at the configured tick cap or as soon as the environment reports
/// `done`, whichever comes first.
fn run_episode(coordinator: &mut Coordinator, ticks: usize, trace: bool) -> Result<Vec<TickRecord>> {
    coordinator.reset();
    let mut records = Vec::with_capacity(ticks);
    for t in 0..ticks {
        let actions = coordinator.sample_actions();
        let tick = coordinator.step(&actions)?;
        let record = TickRecord::from_tick(t, &tick);
        println!("{record}");
        if trace {
            for line in &tick.info.transitions {
                println!("    {line}");
            }
        }
        let done = tick.done;
        records.push(record);
        if done {
            break;
        }
    }
    Ok(records)
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then the demo
    // default.
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::demo()
    };

    // Apply overrides
    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = cli.ticks_override {
        scenario.simulation.ticks = ticks;
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Build and run
    let mut coordinator = match scenario.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let records = match run_episode(&mut coordinator, scenario.simulation.ticks, cli.trace) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // Final episode line and report
    println!("\n{}", coordinator.render());
    let report = EpisodeReport::from_records(&records);
    println!("\n{report}");

    // Export CSV if requested
    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
