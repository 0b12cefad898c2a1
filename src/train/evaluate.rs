use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::train::trainer::check_label;

/// Fraction of samples whose predicted label matches, in `[0, 1]`.
///
/// `inputs` is laid out as for `train_loop`. Returns 0 for an empty set.
pub fn accuracy(network: &mut Network, inputs: &[f64], labels: &[usize]) -> Result<f64> {
    if inputs.len() != labels.len() * network.input_size() {
        return Err(Error::invalid(format!(
            "{} labels do not match {} input values",
            labels.len(),
            inputs.len()
        )));
    }
    if labels.is_empty() {
        return Ok(0.0);
    }

    let mut correct = 0usize;
    for (input, &label) in inputs.chunks_exact(network.input_size()).zip(labels) {
        check_label(network, label)?;
        if network.predict(input)? == label {
            correct += 1;
        }
    }
    Ok(correct as f64 / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;

    #[test]
    fn counts_matching_predictions() {
        // output 0 = x0, output 1 = x1 (identity hidden layer)
        let spec = NetworkSpec::new(2, 2, 2)
            .with_activation(crate::activation::activation::ActivationFunction::Identity);
        let mut network = Network::from_weights(
            spec,
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        )
        .unwrap();

        let inputs = [1.0, 0.0, 0.0, 1.0, 0.2, 0.7, 0.9, 0.1];
        let labels = [0, 1, 0, 0];
        assert_eq!(accuracy(&mut network, &inputs, &labels).unwrap(), 0.75);
        assert!(accuracy(&mut network, &inputs[..3], &labels[..2]).is_err());
        assert_eq!(accuracy(&mut network, &[], &[]).unwrap(), 0.0);
    }
}
