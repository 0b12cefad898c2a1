use crate::{
    error::{Error, Result},
    loss::mse::MseLoss,
    network::network::Network,
    optim::sgd::Sgd,
    train::train_config::ErrorMetric,
};

/// One online backprop step on a single labelled sample.
///
/// Returns the sample's half squared error, `0.5 * Σ (output - target)²`,
/// measured before the update.
pub fn train_sample(network: &mut Network, input: &[f64], label: usize, optimizer: &Sgd) -> Result<f64> {
    network.check_input(input)?;
    check_label(network, label)?;
    Ok(backprop(network, input, label, optimizer))
}

/// Runs one pass over `n` samples in their given order and returns the
/// epoch error under `metric`. Inputs and labels must already be validated.
pub(crate) fn train_epoch(
    network: &mut Network,
    inputs: &[f64],
    labels: &[usize],
    optimizer: &Sgd,
    metric: ErrorMetric,
) -> f64 {
    let input_size = network.input_size();
    let mut err = 0.0;
    let mut total = 0.0;

    for (input, &label) in inputs.chunks_exact(input_size).zip(labels) {
        let mse = backprop(network, input, label, optimizer);
        err = 0.5 * (err + mse);
        total += mse;
    }

    match metric {
        ErrorMetric::Smoothed => err,
        ErrorMetric::Mean if labels.is_empty() => 0.0,
        ErrorMetric::Mean => total / labels.len() as f64,
    }
}

pub(crate) fn check_label(network: &Network, label: usize) -> Result<()> {
    if label >= network.output_size() {
        return Err(Error::invalid(format!(
            "label {} out of range for {} output units",
            label,
            network.output_size()
        )));
    }
    Ok(())
}

fn backprop(network: &mut Network, input: &[f64], label: usize, optimizer: &Sgd) -> f64 {
    let activation = network.activation();
    let hidden_size = network.hidden_size();

    network.propagate(input);

    // δ3 = y - t
    MseLoss::one_hot_error(&network.outputs, label, &mut network.output_deltas);

    // δ2 must see the hidden→output weights as they were during the forward
    // pass, so it is computed before either matrix moves. The bias slot gets a
    // delta too; no weight reads it.
    for j in 0..=hidden_size {
        let back = network.hidden_output.row_dot(j, &network.output_deltas);
        network.hidden_deltas[j] = back * activation.derivative(network.hidden_activations[j]);
    }

    optimizer.step(&mut network.hidden_output, &network.hidden_activations, &network.output_deltas);
    optimizer.step(&mut network.input_hidden, &network.input_activations, &network.hidden_deltas);

    MseLoss::loss(&network.output_deltas)
}
