use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use ap_controls::{BangBand, ControllerConfig, FirstOrderPlant, Gains, OutputRange};
use ap_core::{Millis, Real};

mod error;
mod sim;

use error::CliResult;
use sim::{SimOptions, simulate, to_csv};

#[derive(Parser)]
#[command(name = "ap-cli")]
#[command(about = "AutoPID CLI - check controller configs and simulate closed loops", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a controller config file
    Check {
        /// Path to the controller YAML file
        config_path: PathBuf,
    },
    /// Write an example controller config
    Init {
        /// Where to write the YAML file
        config_path: PathBuf,
    },
    /// Simulate the controller driving a first-order plant
    Simulate {
        /// Path to the controller YAML file
        config_path: PathBuf,
        /// Target value
        #[arg(long)]
        setpoint: Real,
        /// Initial process value
        #[arg(long, default_value_t = 0.0)]
        initial: Real,
        /// Simulated time in milliseconds
        #[arg(long, default_value_t = 60_000)]
        duration_ms: Millis,
        /// Host loop period in milliseconds
        #[arg(long, default_value_t = 10)]
        tick_ms: Millis,
        /// Plant time constant in milliseconds
        #[arg(long, default_value_t = 5_000.0)]
        tau_ms: Real,
        /// Plant steady-state gain
        #[arg(long, default_value_t = 1.0)]
        plant_gain: Real,
        /// Plant value with zero drive
        #[arg(long, default_value_t = 0.0)]
        ambient: Real,
        /// At-setpoint threshold
        #[arg(long, default_value_t = 0.5)]
        tolerance: Real,
        /// Trace format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config_path } => cmd_check(&config_path),
        Commands::Init { config_path } => cmd_init(&config_path),
        Commands::Simulate {
            config_path,
            setpoint,
            initial,
            duration_ms,
            tick_ms,
            tau_ms,
            plant_gain,
            ambient,
            tolerance,
            format,
            output,
        } => {
            let plant = FirstOrderPlant::new(plant_gain, tau_ms)?.with_ambient(ambient);
            let opts = SimOptions {
                setpoint,
                initial,
                duration_ms,
                tick_ms,
                plant,
                tolerance,
            };
            cmd_simulate(&config_path, &opts, format, output.as_deref())
        }
    }
}

fn cmd_check(config_path: &Path) -> CliResult<()> {
    let config = ControllerConfig::load_yaml(config_path)?;
    eprintln!("✓ Config is valid");
    eprintln!(
        "  gains: kp={} ki={} kd={}",
        config.gains.kp, config.gains.ki, config.gains.kd
    );
    eprintln!("  output: [{}, {}]", config.output.min, config.output.max);
    eprintln!("  time step: {} ms", config.time_step_ms);
    if config.bang_band.is_active() {
        eprintln!(
            "  bang-bang: on={} off={}",
            config.bang_band.on, config.bang_band.off
        );
    }
    if let Some(limit) = config.integral_limit {
        eprintln!("  integral limit: {}", limit);
    }
    Ok(())
}

fn cmd_init(config_path: &Path) -> CliResult<()> {
    let config = ControllerConfig::new(Gains::new(2.0, 0.0005, 0.0), OutputRange::new(0.0, 100.0))
        .with_time_step(100)
        .with_bang_band(BangBand::symmetric(20.0));
    config.save_yaml(config_path)?;
    eprintln!("✓ Wrote {}", config_path.display());
    Ok(())
}

fn cmd_simulate(
    config_path: &Path,
    opts: &SimOptions,
    format: Format,
    output: Option<&Path>,
) -> CliResult<()> {
    let config = ControllerConfig::load_yaml(config_path)?;
    let (samples, summary) = simulate(&config, opts)?;

    let body = match format {
        Format::Csv => to_csv(&samples),
        Format::Json => serde_json::to_string_pretty(&samples)?,
    };

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, body)?;
        eprintln!("✓ Wrote {} samples to {}", samples.len(), path.display());
    } else {
        print!("{}", body);
    }

    eprintln!(
        "  final input: {:.3} (setpoint {:.3})",
        summary.final_input, opts.setpoint
    );
    eprintln!("  final output: {:.3}", summary.final_output);
    eprintln!(
        "  evaluations: {} ({} forced)",
        summary.evaluations, summary.forced
    );
    match summary.settled_at_ms {
        Some(t) => eprintln!("  settled at: {} ms", t),
        None => eprintln!("  did not settle within ±{}", opts.tolerance),
    }
    Ok(())
}
