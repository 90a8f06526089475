//! Session and transport errors.

use std::time::Duration;

use mc_relay_proto::ProtoError;
use thiserror::Error;

use crate::transport::Side;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("upstream {target} refused the connection: {reason}")]
    UpstreamRefused { target: String, reason: String },

    #[error("upstream login timed out after {0:?}")]
    LoginTimeout(Duration),

    #[error("another relayed session is already active")]
    SessionOccupied,

    #[error("{0} connection is closed")]
    PeerClosed(Side),
}
