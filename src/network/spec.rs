use std::io::Write;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::network::store::write_atomically;

/// Shape and hidden activation of a three-layer perceptron.
///
/// Fields:
/// - `input_size`  : length of every input vector (bias unit not counted)
/// - `hidden_size` : number of hidden units (bias unit not counted)
/// - `output_size` : number of output units, one per class label
/// - `activation`  : nonlinearity applied to the hidden layer
///
/// A spec can be kept as a JSON file next to the weights so a run can be
/// reproduced before any training happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
}

impl NetworkSpec {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> NetworkSpec {
        NetworkSpec {
            input_size,
            hidden_size,
            output_size,
            activation: ActivationFunction::default(),
        }
    }

    pub fn with_activation(mut self, activation: ActivationFunction) -> NetworkSpec {
        self.activation = activation;
        self
    }

    /// Every layer needs at least one unit, and both weight arrays must have a
    /// length that fits in `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.hidden_size == 0 || self.output_size == 0 {
            return Err(Error::invalid(format!(
                "layer sizes must be positive, got {} {} {}",
                self.input_size, self.hidden_size, self.output_size
            )));
        }
        if self.checked_lens().is_none() {
            return Err(Error::invalid(format!(
                "layer sizes {} {} {} are too large",
                self.input_size, self.hidden_size, self.output_size
            )));
        }
        Ok(())
    }

    /// `(input_hidden_len, hidden_output_len)`, or `None` if either length or
    /// their sum overflows `usize`.
    pub fn checked_lens(&self) -> Option<(usize, usize)> {
        let input_hidden = self.input_size.checked_add(1)?.checked_mul(self.hidden_size)?;
        let hidden_output = self.hidden_size.checked_add(1)?.checked_mul(self.output_size)?;
        input_hidden.checked_add(hidden_output)?;
        Some((input_hidden, hidden_output))
    }

    /// Length of the input→hidden weight array, `(input_size + 1) * hidden_size`.
    /// Only meaningful for a spec that passed [`validate`](Self::validate).
    pub fn input_hidden_len(&self) -> usize {
        (self.input_size + 1) * self.hidden_size
    }

    /// Length of the hidden→output weight array, `(hidden_size + 1) * output_size`.
    /// Only meaningful for a spec that passed [`validate`](Self::validate).
    pub fn hidden_output_len(&self) -> usize {
        (self.hidden_size + 1) * self.output_size
    }

    /// Half-width of the uniform initialization interval,
    /// `sqrt(6) / sqrt(input_size + hidden_size + 2)` (Glorot & Bengio, 2010).
    pub fn init_range(&self) -> f64 {
        6.0_f64.sqrt() / ((self.input_size + self.hidden_size + 2) as f64).sqrt()
    }

    /// Serializes the spec to a pretty-printed JSON file. The write is all-or-nothing.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomically(path.as_ref(), |w| {
            serde_json::to_writer_pretty(&mut *w, self)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(w)
        })
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Construction {
            path: path.to_path_buf(),
            source,
        })?;
        let spec: NetworkSpec = serde_json::from_reader(std::io::BufReader::new(file))?;
        spec.validate()?;
        Ok(spec)
    }
}
