// Scenario Runner - Load and execute sweep scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/default_sweep.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/default_sweep.yaml --seed 0x1234...

mod sweep;

use csma_cd::{ChannelConfig, CsmaError, CsmaResult};
use log::{error, info};
use simple_logger::SimpleLogger;
use std::env;
use std::fs;
use std::path::Path;
use sweep::{SweepConfig, SweepRunner};

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Grid to sweep
    sweep: SweepGrid,

    /// Channel overrides (missing fields keep their defaults)
    #[serde(default)]
    channel: ChannelConfig,

    /// Hex seed, overridden by --seed on the command line
    #[serde(default)]
    seed: Option<String>,

    #[serde(default)]
    csv_output: Option<String>,

    #[serde(default)]
    event_logging: bool,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SweepGrid {
    populations: Vec<usize>,
    arrival_rates: Vec<f64>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX] [--verbose]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/default_sweep.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/default_sweep.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let verbose = args.iter().any(|a| a == "--verbose");
    SimpleLogger::new()
        .with_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init()
        .unwrap();

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed = match args.iter().position(|a| a == "--seed") {
        Some(i) => match args.get(i + 1).map(|hex| parse_seed_hex(hex)) {
            Some(Ok(seed)) => Some(seed),
            Some(Err(e)) => {
                error!("{}", e);
                std::process::exit(1);
            }
            None => {
                error!("--seed needs a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let outcome = if path.is_file() {
        run_scenario_file(path, seed)
    } else if path.is_dir() {
        run_scenario_directory(path, seed)
    } else {
        Err(CsmaError::Scenario(format!(
            "Path does not exist: {}",
            path.display()
        )))
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) -> CsmaResult<()> {
    let mut scenarios = Vec::new();

    // Find all .yaml files
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        ) {
            scenarios.push(path);
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        return Err(CsmaError::Scenario(format!(
            "No .yaml files found in {}",
            dir.display()
        )));
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed)?;
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    Ok(())
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) -> CsmaResult<()> {
    info!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path)?;
    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)?;

    let config = build_config(scenario.meta.name.as_deref(), &scenario, seed)?;

    println!("\n╔════════════════════════════════════════════════════════╗");
    match scenario.meta.name {
        Some(ref name) => println!("║  {}", name),
        None => println!("║  Scenario: {}", path.display()),
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    println!("Configuration:");
    println!("  Populations: {:?}", config.populations);
    println!("  Arrival rates: {:?}", config.arrival_rates);
    println!("  Horizon: {}s", config.channel.horizon);
    println!(
        "  Frame: {} bits @ {} bit/s, slot {} bits, max retries {}",
        config.channel.frame_bits,
        config.channel.bit_rate,
        config.channel.backoff_slot_bits,
        config.channel.max_retries
    );
    println!("\nStarting sweep...\n");

    let result = SweepRunner::new(config).run()?;
    result.print_summary();

    println!("\n✓ Scenario complete!\n");
    Ok(())
}

fn build_config(
    name: Option<&str>,
    scenario: &ScenarioFile,
    seed: Option<[u8; 32]>,
) -> CsmaResult<SweepConfig> {
    let file_seed = match scenario.seed {
        Some(ref hex) => Some(parse_seed_hex(hex)?),
        None => None,
    };

    scenario.channel.validate()?;
    if scenario.sweep.populations.is_empty() || scenario.sweep.arrival_rates.is_empty() {
        return Err(CsmaError::Scenario(format!(
            "{}: sweep needs at least one population and one arrival rate",
            name.unwrap_or("scenario")
        )));
    }

    Ok(SweepConfig {
        populations: scenario.sweep.populations.clone(),
        arrival_rates: scenario.sweep.arrival_rates.clone(),
        seed: seed.or(file_seed),
        channel: scenario.channel.clone(),
        enable_event_logging: scenario.event_logging,
        csv_output_path: scenario.csv_output.clone(),
    })
}

fn parse_seed_hex(hex: &str) -> CsmaResult<[u8; 32]> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk)
            .map_err(|e| CsmaError::Scenario(format!("Invalid hex seed: {}", e)))?;
        seed[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|e| CsmaError::Scenario(format!("Invalid hex seed: {}", e)))?;
    }

    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_hex() {
        let seed = parse_seed_hex("0x0102ff").unwrap();

        assert_eq!(&seed[..3], &[0x01, 0x02, 0xff]);
        assert!(seed[3..].iter().all(|&b| b == 0));
        assert!(parse_seed_hex("zz").is_err());
    }

    #[test]
    fn test_scenario_yaml_overrides() {
        let yaml = r#"
meta:
  name: short
sweep:
  populations: [10, 20]
  arrival_rates: [5, 12.5]
channel:
  horizon: 2.0
seed: "0x2a"
"#;
        let scenario: ScenarioFile = serde_yaml::from_str(yaml).unwrap();

        let config = build_config(Some("short"), &scenario, None).unwrap();

        assert_eq!(config.populations, vec![10, 20]);
        assert_eq!(config.arrival_rates, vec![5.0, 12.5]);
        assert_eq!(config.channel.horizon, 2.0);
        assert_eq!(config.channel.frame_bits, 1500.0);
        assert_eq!(config.seed.unwrap()[0], 0x2a);
        assert!(!config.enable_event_logging);

        let cli_seed = [7u8; 32];
        let config = build_config(None, &scenario, Some(cli_seed)).unwrap();
        assert_eq!(config.seed, Some(cli_seed));
    }

    #[test]
    fn test_scenario_rejects_empty_grid() {
        let yaml = "sweep:\n  populations: []\n  arrival_rates: [5]\n";
        let scenario: ScenarioFile = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(
            build_config(None, &scenario, None),
            Err(CsmaError::Scenario(_))
        ));
    }
}
