use std::time::Instant;

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{check_label, train_epoch};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` online, one sample at a time, for `config.epochs` epochs
/// and returns the statistics of every completed epoch.
///
/// # Arguments
/// - `network` : mutable reference to the network; modified in place
/// - `inputs`  : `labels.len()` samples flattened back to back, each
///               `network.input_size()` values long
/// - `labels`  : class index of every sample, each below `output_size`
/// - `config`  : epochs, learning rate, error metric, optional progress channel
///
/// Samples are visited in the order given, every epoch; there is no shuffling
/// and no convergence check. Each sample's update lands before the next
/// sample's forward pass.
///
/// # Early termination
/// The loop breaks early only if the `progress_tx` receiver has been dropped.
///
/// # Errors
/// `InvalidArgument` if there are no samples, the input length is not
/// `labels.len() * input_size`, a label is out of range or the learning rate
/// is not finite. The network is untouched in that case.
pub fn train_loop(
    network: &mut Network,
    inputs: &[f64],
    labels: &[usize],
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    validate(network, inputs, labels, config)?;

    let optimizer = Sgd::new(config.learning_rate);
    let mut history = Vec::new();

    for epoch in 0..config.epochs {
        let t_start = Instant::now();
        let error = train_epoch(network, inputs, labels, &optimizer, config.metric);
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        tracing::info!("epoch {}, {} error {:.6}", epoch, config.metric, error);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            error,
            elapsed_ms,
        };
        history.push(stats);

        if let Some(ref tx) = config.progress_tx {
            if tx.send(stats).is_err() {
                tracing::debug!("progress receiver dropped, stopping after epoch {}", epoch);
                break;
            }
        }
    }

    Ok(history)
}

impl Network {
    /// Convenience wrapper around [`train_loop`] with the default error metric.
    pub fn train(
        &mut self,
        inputs: &[f64],
        labels: &[usize],
        epochs: usize,
        learning_rate: f64,
    ) -> Result<Vec<EpochStats>> {
        train_loop(self, inputs, labels, &TrainConfig::new(epochs, learning_rate))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn validate(network: &Network, inputs: &[f64], labels: &[usize], config: &TrainConfig) -> Result<()> {
    if labels.is_empty() {
        return Err(Error::invalid("no training samples"));
    }
    let expected = labels.len() * network.input_size();
    if inputs.len() != expected {
        return Err(Error::invalid(format!(
            "{} samples of {} inputs need {} values, got {}",
            labels.len(),
            network.input_size(),
            expected,
            inputs.len()
        )));
    }
    if !config.learning_rate.is_finite() {
        return Err(Error::invalid(format!(
            "learning rate must be finite, got {}",
            config.learning_rate
        )));
    }
    for &label in labels {
        check_label(network, label)?;
    }
    Ok(())
}
