pub mod client;
pub mod drain;
pub mod error;
pub mod sinks;

pub use error::{BrokerError, BrokerResult};
