pub mod error;
pub mod math;
pub mod activation;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod dataset;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use network::store::{WeightFormat, WeightStore};
pub use loss::mse::MseLoss;
pub use optim::sgd::Sgd;
pub use train::{train_loop, train_sample, accuracy, EpochStats, ErrorMetric, TrainConfig};
pub use dataset::Dataset;
