pub mod config;
pub mod domain;
pub mod error;
pub mod fixtures;
pub mod prompt;
pub mod transport;

pub use config::Config;
pub use domain::{InternalOrder, NetworkAddresses, SignedOrder};
pub use error::FixtureError;
pub use fixtures::FixtureSeeder;
pub use transport::{with_pipeline, Chain, MockChain, Pipeline, RpcError};
