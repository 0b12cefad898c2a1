use std::path::Path;

use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::spec::NetworkSpec;

/// Bias unit appended to the input and hidden activations.
pub(crate) const BIAS: f64 = 1.0;

/// A single-hidden-layer perceptron with a linear output layer.
///
/// The network owns its two weight matrices and every scratch buffer used by
/// the forward and backward passes. All of them are allocated once, in the
/// constructor, and keep their size for the network's lifetime.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) spec: NetworkSpec,
    /// `(input_size + 1) x hidden_size`; the last row holds the hidden biases.
    pub(crate) input_hidden: Matrix,
    /// `(hidden_size + 1) x output_size`; the last row holds the output biases.
    pub(crate) hidden_output: Matrix,

    /// Input vector followed by the bias unit.
    pub(crate) input_activations: Vec<f64>,
    /// Pre-activation sums of the hidden layer.
    pub(crate) hidden_sums: Vec<f64>,
    /// Hidden outputs followed by the bias unit.
    pub(crate) hidden_activations: Vec<f64>,
    /// Output layer values; the output layer is linear so these are also its sums.
    pub(crate) outputs: Vec<f64>,

    pub(crate) hidden_deltas: Vec<f64>,
    pub(crate) output_deltas: Vec<f64>,
}

impl Network {
    /// Builds a network with uniformly random weights drawn from the thread RNG.
    pub fn new(spec: NetworkSpec) -> Result<Network> {
        Network::with_rng(spec, &mut rand::thread_rng())
    }

    /// Builds a network with weights drawn uniformly from
    /// `[-spec.init_range(), spec.init_range()]` using `rng`.
    pub fn with_rng<R: Rng>(spec: NetworkSpec, rng: &mut R) -> Result<Network> {
        spec.validate()?;
        let range = spec.init_range();
        let input_hidden = Matrix::uniform(spec.input_size + 1, spec.hidden_size, range, rng);
        let hidden_output = Matrix::uniform(spec.hidden_size + 1, spec.output_size, range, rng);
        Ok(Network::assemble(spec, input_hidden, hidden_output))
    }

    /// Builds a network around caller-supplied row-major weight arrays.
    pub fn from_weights(
        spec: NetworkSpec,
        input_hidden: Vec<f64>,
        hidden_output: Vec<f64>,
    ) -> Result<Network> {
        spec.validate()?;
        let input_hidden = Matrix::from_vec(spec.input_size + 1, spec.hidden_size, input_hidden)?;
        let hidden_output =
            Matrix::from_vec(spec.hidden_size + 1, spec.output_size, hidden_output)?;
        Ok(Network::assemble(spec, input_hidden, hidden_output))
    }

    /// Constructor mirroring the `(sizes, optional weight file)` entry point.
    ///
    /// Without a source the weights are random. With a source the layer sizes
    /// stored in the file win over the ones in `spec`; only `spec.activation`
    /// is kept.
    pub fn construct(spec: NetworkSpec, source: Option<&Path>) -> Result<Network> {
        match source {
            Some(path) => Network::load(path, spec.activation),
            None => Network::new(spec),
        }
    }

    fn assemble(spec: NetworkSpec, input_hidden: Matrix, hidden_output: Matrix) -> Network {
        let NetworkSpec { input_size, hidden_size, output_size, .. } = spec;
        Network {
            spec,
            input_hidden,
            hidden_output,
            input_activations: vec![0.0; input_size + 1],
            hidden_sums: vec![0.0; hidden_size],
            hidden_activations: vec![0.0; hidden_size + 1],
            outputs: vec![0.0; output_size],
            hidden_deltas: vec![0.0; hidden_size + 1],
            output_deltas: vec![0.0; output_size],
        }
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn input_size(&self) -> usize {
        self.spec.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.spec.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.spec.output_size
    }

    pub fn activation(&self) -> ActivationFunction {
        self.spec.activation
    }

    pub fn input_hidden(&self) -> &Matrix {
        &self.input_hidden
    }

    pub fn hidden_output(&self) -> &Matrix {
        &self.hidden_output
    }

    /// Hidden outputs of the last forward pass, bias unit included.
    pub fn hidden_activations(&self) -> &[f64] {
        &self.hidden_activations
    }

    /// Hidden pre-activation sums of the last forward pass.
    pub fn hidden_sums(&self) -> &[f64] {
        &self.hidden_sums
    }

    /// Output values of the last forward pass.
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    pub(crate) fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.spec.input_size {
            return Err(Error::invalid(format!(
                "input has {} values, network expects {}",
                input.len(),
                self.spec.input_size
            )));
        }
        Ok(())
    }

    /// Forward pass; stores activations in the network for backprop and
    /// returns the output layer.
    pub fn forward(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.check_input(input)?;
        self.propagate(input);
        Ok(&self.outputs)
    }

    /// Forward pass on an input already known to have `input_size` entries.
    pub(crate) fn propagate(&mut self, input: &[f64]) {
        let NetworkSpec { input_size, hidden_size, output_size, activation } = self.spec;

        self.input_activations[..input_size].copy_from_slice(input);
        self.input_activations[input_size] = BIAS;

        for j in 0..hidden_size {
            let z = self.input_hidden.column_dot(j, &self.input_activations);
            self.hidden_sums[j] = z;
            self.hidden_activations[j] = activation.function(z);
        }
        self.hidden_activations[hidden_size] = BIAS;

        for j in 0..output_size {
            self.outputs[j] = self.hidden_output.column_dot(j, &self.hidden_activations);
        }
    }

    /// Returns the label of the largest output. Ties go to the lowest index.
    pub fn predict(&mut self, input: &[f64]) -> Result<usize> {
        self.forward(input)?;
        Ok(argmax(&self.outputs))
    }
}

/// Index of the maximum element; an element only wins if strictly greater.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn constant(spec: NetworkSpec, w: f64) -> Network {
        Network::from_weights(
            spec,
            vec![w; spec.input_hidden_len()],
            vec![w; spec.hidden_output_len()],
        )
        .unwrap()
    }

    #[test]
    fn random_weights_stay_inside_glorot_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(i, h, o) in &[(1, 1, 1), (2, 2, 2), (13, 7, 3), (784, 64, 10)] {
            let spec = NetworkSpec::new(i, h, o);
            let range = spec.init_range();
            let net = Network::with_rng(spec, &mut rng).unwrap();
            assert_eq!(net.input_hidden().len(), spec.input_hidden_len());
            assert_eq!(net.hidden_output().len(), spec.hidden_output_len());
            assert!(net
                .input_hidden()
                .as_slice()
                .iter()
                .chain(net.hidden_output().as_slice())
                .all(|w| (-range..=range).contains(w)));
        }
    }

    #[test]
    fn hand_computed_forward_pass() {
        // z = 0.1 * 1.0 + 0.1 * 0.0 + 0.1 * bias = 0.2 for both hidden units
        // y = 0.1 * s + 0.1 * s + 0.1 * bias, s = sigmoid(0.2)
        let mut net = constant(NetworkSpec::new(2, 2, 2), 0.1);
        let out = net.forward(&[1.0, 0.0]).unwrap().to_vec();

        let s = 1.0 / (1.0 + (-0.2f64).exp());
        assert_abs_diff_eq!(s, 0.549_833_997_312_478, epsilon = 1e-12);
        assert_abs_diff_eq!(net.hidden_sums()[0], 0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(net.hidden_activations()[0], s, epsilon = 1e-15);
        assert_abs_diff_eq!(net.hidden_activations()[1], s, epsilon = 1e-15);
        assert_eq!(net.hidden_activations()[2], 1.0);
        assert_abs_diff_eq!(out[0], 0.2 * s + 0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 0.209_966_799_462_495_6, epsilon = 1e-12);
    }

    #[test]
    fn forward_is_deterministic() {
        let mut net = Network::with_rng(NetworkSpec::new(3, 4, 2), &mut StdRng::seed_from_u64(1)).unwrap();
        let first = net.forward(&[0.3, -1.2, 2.0]).unwrap().to_vec();
        let second = net.forward(&[0.3, -1.2, 2.0]).unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn forward_rejects_wrong_input_length() {
        let mut net = constant(NetworkSpec::new(2, 2, 2), 0.1);
        assert!(matches!(net.forward(&[1.0]), Err(Error::InvalidArgument(_))));
        assert!(net.predict(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 0.9, 0.9, 0.1]), 1);
        assert_eq!(argmax(&[2.0, 2.0]), 0);
        assert_eq!(argmax(&[-1.0, 3.0]), 1);
    }

    #[test]
    fn predict_breaks_ties_towards_lower_label() {
        // identical weight columns give identical outputs
        let mut net = constant(NetworkSpec::new(2, 3, 4), 0.25);
        assert_eq!(net.predict(&[0.7, -0.2]).unwrap(), 0);
    }

    #[test]
    fn construct_without_source_uses_given_sizes() {
        let net = Network::construct(NetworkSpec::new(5, 3, 2), None).unwrap();
        assert_eq!((net.input_size(), net.hidden_size(), net.output_size()), (5, 3, 2));
    }

    #[test]
    fn construct_from_missing_file_fails() {
        let err = Network::construct(
            NetworkSpec::new(2, 2, 2),
            Some(Path::new("/nonexistent/dir/weights.txt")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Construction { .. }));
    }
}
