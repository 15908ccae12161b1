//! ffte-runner: OpenAPI discovery, HTTP transport and the scan loop

pub mod discovery;
pub mod scan;
pub mod transport;

pub use discovery::{
    DiscoveryError, Operation, ParamLocation, Parameter, extract_operations, load_operations,
};
pub use scan::{ScanOutput, Scanner};
pub use transport::{ReqwestTransport, Transport};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("No operations found in OpenAPI document")]
    NoOperations,
    #[error("No base URL: set base_url or use a spec URL")]
    MissingBaseUrl,
    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("HTTP client error: {0}")]
    Client(String),
}
