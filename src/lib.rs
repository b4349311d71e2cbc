//! Connect to and disconnect from a Redis server.
//!
//! The connection URL comes from an explicit argument, the `REDIS_URL` setting, or
//! `redis://localhost:6379/0`, in that order.

pub mod config;
pub mod error;
pub mod store;

pub use config::{resolve_url, Settings, DEFAULT_REDIS_URL};
pub use error::{ConnectError, ConnectResult, ConnectionError};
pub use store::{
    connect, disconnect, Connection, Connector, DisconnectOutcome, ErrorListener, GracefulClose,
    ReportingConnection,
};
