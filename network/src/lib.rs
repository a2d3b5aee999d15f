//! Lectern Network Executor
//!
//! The request/response exchange with the graph API. Nothing here touches
//! the store; callers decide what to normalize.

mod error;
mod executor;
mod protocol;
mod transport;

pub use error::{NetworkError, NetworkResult, TransportError};
pub use executor::NetworkExecutor;
pub use protocol::{GraphError, GraphRequest, GraphResponse};
pub use transport::{HttpTransport, Transport};
