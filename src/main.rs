//! marchenko: Marchenko redatuming from surface reflection data.

mod data;
mod log;
mod pipeline;

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::log::run_log::RunLog;
use pipeline::config::{Precision, RunConfig};
use pipeline::run::run_pipeline;
use pipeline::synth::{write_scenario, Reflector, SynthOptions};

#[derive(Parser)]
#[command(
    name = "marchenko",
    version,
    about = "Retrieve focusing and Green's functions by Marchenko redatuming"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the redatuming described by a JSON configuration
    Run {
        /// Run configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Override the number of iterations
        #[arg(long)]
        nitr: Option<usize>,

        /// Override the taper fraction
        #[arg(long)]
        taper: Option<f64>,

        /// Override the output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write outputs as f64 instead of f32
        #[arg(long = "f64", default_value_t = false)]
        double: bool,
    },

    /// Write a synthetic input set and its configuration
    Synth {
        /// Output directory
        #[arg(short, long, default_value = "synthetic")]
        out: PathBuf,

        /// Time samples
        #[arg(long, default_value_t = 500)]
        ts: usize,

        /// Channels
        #[arg(long, default_value_t = 10)]
        ns: usize,

        /// Time sample interval (s)
        #[arg(long, default_value_t = 0.002)]
        dt: f64,

        /// Channel spacing (m)
        #[arg(long, default_value_t = 16.0)]
        dx: f64,

        /// Offset of the first channel (m)
        #[arg(long, default_value_t = 4.0)]
        o_min: f64,

        /// Direct arrival lag on the first channel (samples)
        #[arg(long, default_value_t = 50)]
        arrival: usize,

        /// Extra lag per channel (samples)
        #[arg(long, default_value_t = 1)]
        moveout: usize,

        /// Add a flat reflector with this amplitude
        #[arg(long)]
        reflector: Option<f64>,

        /// Iterations written to the configuration
        #[arg(long, default_value_t = 5)]
        nitr: usize,
    },

    /// Print the header and amplitude statistics of an array file
    Inspect {
        /// Array file
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            nitr,
            taper,
            out,
            double,
        } => {
            let mut run_config = RunConfig::load(&config)?;
            if let Some(n) = nitr {
                run_config.params.nitr = n;
            }
            if let Some(tp) = taper {
                run_config.params.tp = tp;
            }
            if let Some(dir) = out {
                run_config.output_dir = dir;
            }
            if double {
                run_config.precision = Precision::F64;
            }
            run_config.validate()?;

            ::log::info!(
                "Starting marchenko v{} with {}",
                env!("CARGO_PKG_VERSION"),
                config.display()
            );
            let mut run_log = RunLog::new(&config, &run_config);
            let report = run_pipeline(&run_config, &mut run_log)?;
            println!(
                "Wrote {} arrays to {}",
                report.outputs.len(),
                run_config.output_dir.display()
            );
            if let Some(c) = report.comparison {
                println!("Ground truth: {}", c);
            }
        }
        Command::Synth {
            out,
            ts,
            ns,
            dt,
            dx,
            o_min,
            arrival,
            moveout,
            reflector,
            nitr,
        } => {
            let opts = SynthOptions {
                ts,
                ns,
                dt,
                dx,
                o_min,
                arrival_samples: arrival,
                moveout_samples: moveout,
                nitr,
                reflector: reflector.map(|amplitude| Reflector { amplitude }),
                ..SynthOptions::default()
            };
            let path = write_scenario(&out, &opts)?;
            println!("Configuration written to {}", path.display());
        }
        Command::Inspect { file } => {
            let mut reader = BufReader::new(File::open(&file)?);
            let (header, values) = marchenko_io::read_array(&mut reader)?;
            let peak = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            let rms = if values.is_empty() {
                0.0
            } else {
                (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
            };
            println!("{}", file.display());
            println!("  Element type: {}", header.kind);
            println!("  Dimensions:   {:?}", header.dims);
            println!("  Samples:      {}", values.len());
            println!("  Peak |value|: {:.6e}", peak);
            println!("  RMS:          {:.6e}", rms);
        }
    }
    Ok(())
}
