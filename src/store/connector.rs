use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::{resolve_url, Settings};
use crate::error::{ConnectError, ConnectResult, ConnectionError};
use crate::store::connection::Connection;

/// Receives connection errors that happen after `connect` returned
pub type ErrorListener = Arc<dyn Fn(&ConnectionError) + Send + Sync>;

fn log_error(err: &ConnectionError) {
    tracing::error!(
        error = %err,
        kind = ?err.kind(),
        code = err.code(),
        "Redis connection error"
    );
}

/// Opens Redis connections from an explicit URL or configured fallbacks
#[derive(Clone)]
pub struct Connector {
    settings: Settings,
    listener: ErrorListener,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Connector {
    /// Creates a connector that logs asynchronous connection errors
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            listener: Arc::new(log_error),
        }
    }

    /// Creates a connector configured from `REDIS_URL` (and `.env`)
    pub fn from_env() -> ConnectResult<Self> {
        Ok(Self::new(Settings::from_env()?))
    }

    /// Routes asynchronous connection errors to `listener` instead of the log
    pub fn on_error<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ConnectionError) + Send + Sync + 'static,
    {
        self.listener = Arc::new(listener);
        self
    }

    /// Routes asynchronous connection errors into a channel
    pub fn error_channel(self) -> (Self, mpsc::UnboundedReceiver<ConnectionError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = self.on_error(move |err: &ConnectionError| {
            if tx.send(err.clone()).is_err() {
                log_error(err);
            }
        });
        (connector, rx)
    }

    /// The URL `connect(url)` would use
    pub fn resolve_url(&self, url: Option<&str>) -> String {
        resolve_url(url, &self.settings)
    }

    /// Opens a connection and returns without waiting for the socket
    ///
    /// Inside a Tokio runtime the connection is dialed in the background and any
    /// failure goes to the error listener.
    pub fn connect(&self, url: Option<&str>) -> ConnectResult<Connection> {
        let url = self.resolve_url(url);
        let conn = Connection::open(url, self.listener.clone())?;
        conn.warm_up();
        Ok(conn)
    }

    /// Like [`Connector::connect`], for URLs from untyped sources
    ///
    /// `null` counts as absent. Anything other than a string fails with
    /// [`ConnectError::InvalidArgument`] before any network activity.
    pub fn connect_value(&self, url: Option<&Value>) -> ConnectResult<Connection> {
        let url = match url {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(url.as_str()),
            Some(other) => return Err(ConnectError::InvalidArgument(other.to_string())),
        };
        self.connect(url)
    }
}

/// Opens a connection using `url`, then `REDIS_URL`, then the local default
pub fn connect(url: Option<&str>) -> ConnectResult<Connection> {
    Connector::from_env()?.connect(url)
}
