use crate::error::{ConnectError, ConnectResult};
use crate::store::connection::Connection;

/// A handle that can be asked to close gracefully
#[cfg_attr(test, mockall::automock)]
pub trait GracefulClose {
    /// Issues the close request; `Ok` does not mean the socket is already closed
    fn quit(&self) -> ConnectResult<()>;
}

impl GracefulClose for Connection {
    fn quit(&self) -> ConnectResult<()> {
        Connection::quit(self)
    }
}

/// Result of [`disconnect`]
#[derive(Debug)]
pub enum DisconnectOutcome {
    /// The close request was issued
    Closed,
    /// Issuing the close request failed
    Failed(ConnectError),
}

impl DisconnectOutcome {
    /// 0 on success, 1 on failure
    pub fn code(&self) -> i32 {
        match self {
            DisconnectOutcome::Closed => 0,
            DisconnectOutcome::Failed(_) => 1,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, DisconnectOutcome::Closed)
    }

    pub fn error(&self) -> Option<&ConnectError> {
        match self {
            DisconnectOutcome::Closed => None,
            DisconnectOutcome::Failed(e) => Some(e),
        }
    }
}

/// Asks `conn` to close, swallowing any failure
///
/// Callers that only care about the exit code use [`DisconnectOutcome::code`].
pub fn disconnect<C: GracefulClose + ?Sized>(conn: &C) -> DisconnectOutcome {
    match conn.quit() {
        Ok(()) => DisconnectOutcome::Closed,
        Err(e) => {
            tracing::debug!(error = %e, "Redis disconnect failed");
            DisconnectOutcome::Failed(e)
        }
    }
}
