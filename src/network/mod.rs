pub mod network;
pub mod spec;
pub mod store;

pub use network::Network;
pub use spec::NetworkSpec;
pub use store::{WeightFormat, WeightStore};
