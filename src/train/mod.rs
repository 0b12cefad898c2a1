pub mod trainer;
pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;
pub mod evaluate;

pub use trainer::train_sample;
pub use epoch_stats::EpochStats;
pub use train_config::{ErrorMetric, TrainConfig};
pub use loop_fn::train_loop;
pub use evaluate::accuracy;
