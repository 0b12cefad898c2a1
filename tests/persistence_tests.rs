//! End-to-end tests: build, train, save in every format, load back.

use approx::assert_abs_diff_eq;
use catseye_nn::*;
use rand::{rngs::StdRng, SeedableRng};
use tempfile::tempdir;

fn trained_network(activation: ActivationFunction, seed: u64) -> Network {
    let spec = NetworkSpec::new(3, 5, 4).with_activation(activation);
    let mut network = Network::with_rng(spec, &mut StdRng::seed_from_u64(seed)).unwrap();
    let inputs = [
        0.1, 0.2, 0.3,
        0.9, 0.1, 0.4,
        -0.5, 0.7, 0.0,
        0.3, -0.3, 0.8,
    ];
    network.train(&inputs, &[0, 1, 2, 3], 25, 0.05).unwrap();
    network
}

// =============================================================================
// Text form
// =============================================================================

#[test]
fn text_round_trip_is_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");

    let mut original = trained_network(ActivationFunction::Sigmoid, 11);
    original.save(&path, WeightFormat::Text).unwrap();
    let mut loaded = Network::load(&path, ActivationFunction::Sigmoid).unwrap();

    assert_eq!(loaded.to_store(), original.to_store());

    let input = [0.25, -0.4, 0.6];
    let a = original.forward(&input).unwrap().to_vec();
    let b = loaded.forward(&input).unwrap().to_vec();
    assert_eq!(a, b);
}

#[test]
fn text_file_has_sizes_then_two_weight_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    trained_network(ActivationFunction::Tanh, 2).save(&path, WeightFormat::Text).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "3 5 4");
    assert_eq!(lines[1].split(' ').count(), (3 + 1) * 5);
    assert_eq!(lines[2].split(' ').count(), (5 + 1) * 4);
}

#[test]
fn construct_from_file_takes_sizes_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    trained_network(ActivationFunction::Sigmoid, 5).save(&path, WeightFormat::Text).unwrap();

    let caller_spec = NetworkSpec::new(100, 1, 1).with_activation(ActivationFunction::ReLU);
    let network = Network::construct(caller_spec, Some(path.as_path())).unwrap();
    assert_eq!(
        (network.input_size(), network.hidden_size(), network.output_size()),
        (3, 5, 4)
    );
    assert_eq!(network.activation(), ActivationFunction::ReLU);
}

#[test]
fn loading_garbage_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    std::fs::write(&path, "2 2 2\n0.1 0.2\n").unwrap();
    assert!(matches!(
        Network::load(&path, ActivationFunction::Sigmoid),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn oversized_layer_header_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    for text in ["18446744073709551615 2 1\n0.1\n", "1000000000 1000000000 1\n0.5\n"] {
        std::fs::write(&path, text).unwrap();
        let err = Network::construct(NetworkSpec::new(2, 2, 1), Some(path.as_path())).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err}");
    }

    let bin = dir.path().join("weights.bin");
    let header: Vec<u8> = [i32::MAX; 3].iter().flat_map(|n| n.to_ne_bytes()).collect();
    std::fs::write(&bin, header).unwrap();
    assert!(matches!(
        Network::load_binary(&bin, ActivationFunction::Sigmoid),
        Err(Error::Parse { .. })
    ));

    let json = dir.path().join("weights.json");
    std::fs::write(
        &json,
        r#"{"input_size":18446744073709551615,"hidden_size":2,"output_size":1,"input_hidden":[],"hidden_output":[]}"#,
    )
    .unwrap();
    assert!(matches!(Network::load_json(&json), Err(Error::InvalidArgument(_))));
}

#[test]
fn loading_missing_file_is_a_construction_error() {
    let dir = tempdir().unwrap();
    let err = Network::load(dir.path().join("absent.txt"), ActivationFunction::Sigmoid).unwrap_err();
    assert!(matches!(err, Error::Construction { .. }));
}

// =============================================================================
// Binary, script and JSON forms
// =============================================================================

#[test]
fn binary_file_size_and_reload_precision() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.bin");
    let original = trained_network(ActivationFunction::ScaledTanh, 8);
    original.save(&path, WeightFormat::Binary).unwrap();

    let len = std::fs::metadata(&path).unwrap().len() as usize;
    assert_eq!(len, 12 + 4 * ((3 + 1) * 5 + (5 + 1) * 4));

    let loaded = Network::load_binary(&path, ActivationFunction::ScaledTanh).unwrap();
    let before = original.to_store();
    let after = loaded.to_store();
    for (a, b) in before
        .input_hidden
        .iter()
        .chain(&before.hidden_output)
        .zip(after.input_hidden.iter().chain(&after.hidden_output))
    {
        assert_eq!(*b, *a as f32 as f64);
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }
}

#[test]
fn script_declares_config_and_weight_arrays() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.js");
    trained_network(ActivationFunction::SoftSign, 4).save(&path, WeightFormat::Script).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "var config = [3,5,4];");
    assert!(lines[1].starts_with("var w1 = [") && lines[1].ends_with("];"));
    assert!(lines[2].starts_with("var w2 = [") && lines[2].ends_with("];"));
    assert_eq!(lines[1].matches(',').count(), 20 - 1);
    assert_eq!(lines[2].matches(',').count(), 24 - 1);
}

#[test]
fn json_keeps_activation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.json");
    let original = trained_network(ActivationFunction::Tanh, 9);
    original.save(&path, WeightFormat::Json).unwrap();

    let loaded = Network::load_json(&path).unwrap();
    assert_eq!(loaded.activation(), ActivationFunction::Tanh);
    let (a, b) = (original.to_store(), loaded.to_store());
    assert_eq!(b.spec(), a.spec());
    for (x, y) in a.input_hidden.iter().chain(&a.hidden_output).zip(b.input_hidden.iter().chain(&b.hidden_output)) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-15);
    }
}

// =============================================================================
// Failed saves
// =============================================================================

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no/such/dir/weights.txt");
    let err = trained_network(ActivationFunction::Sigmoid, 1)
        .save(&path, WeightFormat::Text)
        .unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert!(!path.exists());
}

#[test]
fn failed_save_leaves_no_stray_files() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("taken");
    std::fs::create_dir(&target).unwrap();

    let err = trained_network(ActivationFunction::Sigmoid, 1)
        .save(&target, WeightFormat::Binary)
        .unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert!(target.is_dir());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn overwrite_replaces_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    std::fs::write(&path, "stale").unwrap();

    let network = trained_network(ActivationFunction::Sigmoid, 3);
    network.save(&path, WeightFormat::Text).unwrap();
    let loaded = Network::load(&path, ActivationFunction::Sigmoid).unwrap();
    assert_eq!(loaded.to_store(), network.to_store());
}

// =============================================================================
// Every activation trains
// =============================================================================

#[test]
fn every_activation_trains_to_finite_weights() {
    for activation in ActivationFunction::ALL {
        let network = trained_network(activation, 21);
        let store = network.to_store();
        assert!(
            store.input_hidden.iter().chain(&store.hidden_output).all(|w| w.is_finite()),
            "{activation} produced non-finite weights"
        );
    }
}
