use clap::{Parser, Subcommand};
use jpeg_fit::config::{self, RunConfig};
use jpeg_fit::imaging::GiveUpPolicy;
use jpeg_fit::{output, process};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Source, destination, and ceiling shared by `run` and `plan`.
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Directory containing the JPEG photos to fit
    source: PathBuf,

    /// Directory that receives the fitted copies (created if missing)
    dest: PathBuf,

    /// Maximum size of each output file, in bytes
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    ceiling: u64,

    /// Optional TOML config file (see `jpeg-fit gen-config`)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "jpeg-fit")]
#[command(about = "Fit a directory of JPEG photos under a byte-size ceiling")]
#[command(long_about = "\
Fit a directory of JPEG photos under a byte-size ceiling

Every .jpg/.jpeg file in SOURCE gets a same-named counterpart in DEST that is
at or below CEILING bytes. Files already below the ceiling are copied
byte-for-byte. Larger files are re-encoded, lowering JPEG quality first and
resolution second, until an attempt fits. EXIF metadata is carried over
unchanged and counted against the ceiling.

Search (without --magnify):
  start at full resolution, quality 95
  more than 5x over   → halve the resolution, quality 70
  more than 2x over   → quality -20 (above 60), else resolution x0.6
  otherwise           → quality -10 (above 30), else resolution x0.8
  gives up below 5% resolution or quality 15 (see --on-give-up)

Logging: RUST_LOG overrides -v/-vv. Diagnostics go to stderr.

Run 'jpeg-fit gen-config' to generate a documented jpeg-fit.toml.")]
#[command(version)]
struct Cli {
    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit every JPEG in SOURCE under CEILING bytes and write them to DEST
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Resize by this factor (at most 100) at quality 100 instead of searching
        #[arg(long, value_name = "FACTOR")]
        magnify: Option<f64>,

        /// What to write when the search cannot reach the ceiling
        #[arg(long, value_enum)]
        on_give_up: Option<GiveUpPolicy>,

        /// Number of files processed at the same time
        #[arg(long)]
        workers: Option<usize>,

        /// Predict the starting resolution from the pixel count
        #[arg(long)]
        estimate: bool,

        /// Write a JSON report of every file's outcome
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Show which files would be copied or re-encoded, without writing anything
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print a stock jpeg-fit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            target,
            magnify,
            on_give_up,
            workers,
            estimate,
            report,
        } => {
            let mut run_config = run_config(&target)?;
            run_config.magnification = magnify;
            if let Some(policy) = on_give_up {
                run_config.search.on_give_up = policy;
            }
            if let Some(workers) = workers {
                run_config.workers = workers;
            }
            if estimate {
                run_config.search.estimate_start = true;
            }
            run_config.validate()?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&run_config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let batch = result?;

            println!();
            println!("{}", output::format_summary(&batch.summary));
            if let Some(path) = report {
                batch.write_json(&path)?;
                println!("Report: {}", path.display());
            }
        }
        Command::Plan { target } => {
            let run_config = run_config(&target)?;
            run_config.validate()?;
            let planned = process::plan(&run_config)?;
            output::print_plan(&planned, run_config.ceiling);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults, overridden by the config file if one was given.
fn run_config(target: &TargetArgs) -> Result<RunConfig, config::ConfigError> {
    let file = config::load_config(target.config.as_deref())?;
    Ok(RunConfig::new(
        target.source.clone(),
        target.dest.clone(),
        target.ceiling,
        &file,
    ))
}

/// Diagnostics on stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
