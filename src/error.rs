use std::fmt;

/// Errors returned while connecting to or disconnecting from Redis
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("Illegal URL argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid Redis URL: {0}")]
    InvalidUrl(#[source] redis::RedisError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Connection already closed")]
    Closed,

    #[error("No Tokio runtime available to issue the request")]
    NoRuntime,

    #[error("Failed to load config: {0}")]
    Config(String),
}

pub type ConnectResult<T> = Result<T, ConnectError>;

/// Asynchronous failure reported by the transport after `connect` returned
///
/// `code` is only present when the client library attached one to the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    message: String,
    kind: redis::ErrorKind,
    code: Option<String>,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>, kind: redis::ErrorKind, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            code,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> redis::ErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl From<&redis::RedisError> for ConnectionError {
    fn from(err: &redis::RedisError) -> Self {
        Self::new(err.to_string(), err.kind(), err.code().map(str::to_owned))
    }
}

impl From<redis::RedisError> for ConnectionError {
    fn from(err: redis::RedisError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redis connection error: {}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConnectionError {}
