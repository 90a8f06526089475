//! Transparent game relay: packet pipeline, shadow state, sessions.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extension_host;
pub mod relay;
pub mod session;
pub mod transport;

pub use config::RelayConfig;
pub use error::RelayError;
pub use extension_host::ExtensionHost;
pub use relay::Relay;
