use std::fmt;
use std::str::FromStr;
use std::sync::mpsc;

use serde::{Serialize, Deserialize};

use crate::error::Error;
use crate::train::epoch_stats::EpochStats;

/// How the per-sample errors of one epoch are folded into the reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMetric {
    /// `err = 0.5 * (err + sample_error)`, restarted at 0 every epoch.
    /// Later samples dominate; earlier ones decay geometrically.
    #[default]
    Smoothed,
    /// Arithmetic mean of the per-sample errors.
    Mean,
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorMetric::Smoothed => "smoothed",
            ErrorMetric::Mean => "mean",
        })
    }
}

impl FromStr for ErrorMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smoothed" => Ok(ErrorMetric::Smoothed),
            "mean" => Ok(ErrorMetric::Mean),
            other => Err(Error::invalid(format!("unknown error metric '{other}'"))),
        }
    }
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`        : number of full passes over the samples
/// - `learning_rate` : fixed SGD step size
/// - `metric`        : how the epoch error is computed
/// - `progress_tx`   : optional channel sender; one `EpochStats` is sent per
///                     completed epoch.  If the receiver is dropped the loop
///                     terminates early.
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub metric: ErrorMetric,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with the smoothed metric and no progress channel.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            metric: ErrorMetric::default(),
            progress_tx: None,
        }
    }

    pub fn with_metric(mut self, metric: ErrorMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}

impl Default for TrainConfig {
    /// 1000 epochs at a learning rate of 0.1.
    fn default() -> Self {
        TrainConfig::new(1000, 0.1)
    }
}
