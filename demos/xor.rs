use catseye_nn::{ActivationFunction, Network, NetworkSpec, TrainConfig, WeightFormat, train_loop};

fn main() -> catseye_nn::Result<()> {
    tracing_subscriber::fmt::init();

    let spec = NetworkSpec::new(2, 4, 2).with_activation(ActivationFunction::Tanh);
    let mut network = Network::new(spec)?;

    let inputs = [
        1.0, 0.0,
        1.0, 1.0,
        0.0, 1.0,
        0.0, 0.0,
    ];
    let labels = [1, 0, 1, 0];

    let history = train_loop(&mut network, &inputs, &labels, &TrainConfig::new(5000, 0.05))?;
    if let Some(last) = history.last() {
        println!("final error = {:.6}", last.error);
    }

    for input in inputs.chunks(2) {
        println!("Input: {:?} -> Label: {}", input, network.predict(input)?);
    }

    network.save("xor.txt", WeightFormat::Text)?;
    network.save("xor.js", WeightFormat::Script)?;
    Ok(())
}
