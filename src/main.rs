//! catseye - train and run a single-hidden-layer perceptron from the command line.
//!
//! ```bash
//! catseye train --data blobs.csv --hidden 8 --epochs 500 --save blobs.txt
//! catseye predict --weights blobs.txt --data blobs.csv
//! catseye convert --weights blobs.txt --save blobs.js
//! ```
//!
//! Set `RUST_LOG=debug` for more detail.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use catseye_nn::{
    accuracy, train_loop, ActivationFunction, Dataset, ErrorMetric, Network, NetworkSpec,
    TrainConfig, WeightFormat,
};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catseye")]
#[command(about = "Three-layer perceptron: train, predict, export weights")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a fresh network on a CSV dataset and save its weights
    Train {
        /// CSV file: features then an integer class label per row
        #[arg(short, long)]
        data: PathBuf,

        /// JSON network spec; overrides --hidden, --outputs and --activation
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Number of hidden units
        #[arg(long, default_value = "16")]
        hidden: usize,

        /// Number of output units (defaults to the number of classes in the data)
        #[arg(long)]
        outputs: Option<usize>,

        /// Hidden activation: sigmoid, tanh, scaled_tanh, relu, softsign, identity
        #[arg(short, long, default_value = "sigmoid")]
        activation: ActivationFunction,

        /// Passes over the data
        #[arg(short, long, default_value = "1000")]
        epochs: usize,

        /// Learning rate
        #[arg(long, default_value = "0.1")]
        eta: f64,

        /// Epoch error metric: smoothed or mean
        #[arg(long, default_value = "smoothed")]
        metric: ErrorMetric,

        /// Seed for weight initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Where to write the trained weights
        #[arg(short, long)]
        save: PathBuf,

        /// text, script, binary or json (defaults from the file extension)
        #[arg(short, long)]
        format: Option<WeightFormat>,
    },

    /// Predict a label for every row of a CSV dataset
    Predict {
        /// Saved weights (text, binary or json, picked by extension)
        #[arg(short, long)]
        weights: PathBuf,

        /// Hidden activation the weights were trained with (ignored for json)
        #[arg(short, long, default_value = "sigmoid")]
        activation: ActivationFunction,

        /// CSV file of features, with or without a trailing class index
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Re-encode saved weights in another format
    Convert {
        /// Saved weights (text, binary or json, picked by extension)
        #[arg(short, long)]
        weights: PathBuf,

        /// Hidden activation recorded in json output
        #[arg(short, long, default_value = "sigmoid")]
        activation: ActivationFunction,

        /// Destination file
        #[arg(short, long)]
        save: PathBuf,

        /// text, script, binary or json (defaults from the file extension)
        #[arg(short, long)]
        format: Option<WeightFormat>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> catseye_nn::Result<()> {
    match cli.command {
        Commands::Train {
            data,
            spec,
            hidden,
            outputs,
            activation,
            epochs,
            eta,
            metric,
            seed,
            save,
            format,
        } => {
            let dataset = Dataset::load_csv(&data)?;
            let spec = match spec {
                Some(path) => NetworkSpec::load_json(path)?,
                None => NetworkSpec::new(
                    dataset.input_size,
                    hidden,
                    outputs.unwrap_or_else(|| dataset.class_count()),
                )
                .with_activation(activation),
            };
            info!(
                "training {}x{}x{} ({}) on {} samples",
                spec.input_size, spec.hidden_size, spec.output_size, spec.activation, dataset.len()
            );

            let mut network = match seed {
                Some(seed) => Network::with_rng(spec, &mut StdRng::seed_from_u64(seed))?,
                None => Network::new(spec)?,
            };
            let config = TrainConfig::new(epochs, eta).with_metric(metric);
            train_loop(&mut network, &dataset.inputs, &dataset.labels, &config)?;

            let acc = accuracy(&mut network, &dataset.inputs, &dataset.labels)?;
            info!("training accuracy {:.2}%", acc * 100.0);

            let format = format.unwrap_or_else(|| WeightFormat::from_path(&save));
            network.save(&save, format)?;
            info!("saved {} weights to {}", format, save.display());
        }

        Commands::Predict { weights, activation, data } => {
            let mut network = load_any(&weights, activation)?;
            let dataset = Dataset::load_csv_for(&data, network.input_size())?;
            let mut correct = 0usize;
            for (i, input) in dataset.inputs.chunks_exact(dataset.input_size).enumerate() {
                let label = network.predict(input)?;
                println!("{label}");
                if dataset.labels.get(i) == Some(&label) {
                    correct += 1;
                }
            }
            if dataset.is_labelled() {
                let acc = correct as f64 / dataset.len() as f64;
                info!("accuracy {:.2}% over {} samples", acc * 100.0, dataset.len());
            }
        }

        Commands::Convert { weights, activation, save, format } => {
            let network = load_any(&weights, activation)?;
            let format = format.unwrap_or_else(|| WeightFormat::from_path(&save));
            network.save(&save, format)?;
            info!("wrote {} as {} to {}", weights.display(), format, save.display());
        }
    }
    Ok(())
}

/// Script files are write-only, so anything not json or binary is read as text.
fn load_any(path: &Path, activation: ActivationFunction) -> catseye_nn::Result<Network> {
    match WeightFormat::from_path(path) {
        WeightFormat::Json => Network::load_json(path),
        WeightFormat::Binary => Network::load_binary(path, activation),
        WeightFormat::Text | WeightFormat::Script => Network::load(path, activation),
    }
}
