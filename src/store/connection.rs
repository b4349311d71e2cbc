use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{Client, Cmd, Pipeline, PushInfo, PushKind, RedisFuture, RedisResult, Value};
use tokio::sync::{mpsc, OnceCell};

use crate::error::{ConnectError, ConnectResult, ConnectionError};
use crate::store::connector::ErrorListener;

/// Handle to a Redis server
///
/// Cloning is cheap; clones share one lazily established multiplexed connection.
/// Callers own the handle and must eventually close it, through
/// [`disconnect`](crate::store::disconnect::disconnect) or [`Connection::close`].
#[derive(Clone)]
pub struct Connection {
    url: String,
    client: Client,
    inner: Arc<Inner>,
}

struct Inner {
    conn: OnceCell<ReportingConnection>,
    closed: AtomicBool,
    listener: ErrorListener,
}

/// Multiplexed connection that reports transport failures to the error listener
///
/// Server replies such as `WRONGTYPE` are returned to the caller only.
#[derive(Clone)]
pub struct ReportingConnection {
    conn: MultiplexedConnection,
    listener: ErrorListener,
}

impl ReportingConnection {
    fn new(conn: MultiplexedConnection, inner: &Arc<Inner>) -> Self {
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        conn.get_push_manager().replace_sender(push_tx);
        tokio::spawn(watch_disconnects(push_rx, Arc::downgrade(inner)));

        Self {
            conn,
            listener: inner.listener.clone(),
        }
    }

    fn observe<T>(&self, result: RedisResult<T>) -> RedisResult<T> {
        if let Err(e) = &result {
            if is_transport_error(e) {
                (self.listener)(&ConnectionError::from(e));
            }
        }
        result
    }
}

impl ConnectionLike for ReportingConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        Box::pin(async move {
            let result = self.conn.req_packed_command(cmd).await;
            self.observe(result)
        })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let result = self.conn.req_packed_commands(cmd, offset, count).await;
            self.observe(result)
        })
    }

    fn get_db(&self) -> i64 {
        self.conn.get_db()
    }
}

fn is_transport_error(err: &redis::RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
}

/// Forwards the client's disconnection notice to the listener
///
/// Holds a weak reference so the watcher never keeps the handle alive. Disconnects
/// after the handle was closed are expected and not reported.
async fn watch_disconnects(mut pushes: mpsc::UnboundedReceiver<PushInfo>, inner: Weak<Inner>) {
    while let Some(push) = pushes.recv().await {
        if !matches!(push.kind, PushKind::Disconnection) {
            continue;
        }
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if inner.closed.load(Ordering::SeqCst) {
            continue;
        }
        (inner.listener)(&ConnectionError::new(
            "connection closed by server",
            redis::ErrorKind::IoError,
            None,
        ));
    }
}

impl Connection {
    /// Creates the client without touching the network
    pub(crate) fn open(url: String, listener: ErrorListener) -> ConnectResult<Self> {
        let client = Client::open(url.as_str()).map_err(ConnectError::InvalidUrl)?;

        tracing::debug!(db = client.get_connection_info().redis.db, "Redis client opened");

        Ok(Self {
            url,
            client,
            inner: Arc::new(Inner {
                conn: OnceCell::new(),
                closed: AtomicBool::new(false),
                listener,
            }),
        })
    }

    /// Establishes the connection in the background when a Tokio runtime is running
    ///
    /// Failures go to the error listener. Without a runtime the connection is
    /// established on first use instead.
    pub(crate) fn warm_up(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let conn = self.clone();
        runtime.spawn(async move {
            // Errors were already delivered to the listener
            if conn.multiplexed().await.is_err() {
                return;
            }
            // Pairs with the fence in `quit`: one of the two sides sees the other
            fence(Ordering::SeqCst);
            if conn.is_closed() {
                if let Some(established) = conn.inner.conn.get().cloned() {
                    if let Err(e) = send_quit(established).await {
                        tracing::warn!(error = %e, "Redis QUIT failed");
                    }
                }
            }
        });
    }

    /// The resolved URL this handle was opened with
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Logical database index selected by the URL path
    pub fn db(&self) -> i64 {
        self.client.get_connection_info().redis.db
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Returns the shared connection, dialing the server on first use
    ///
    /// A dial failure is reported to the error listener and returned. The next call
    /// dials again. Transport failures on the returned connection are reported too.
    pub async fn multiplexed(&self) -> ConnectResult<ReportingConnection> {
        if self.is_closed() {
            return Err(ConnectError::Closed);
        }

        let conn = self
            .inner
            .conn
            .get_or_try_init(|| async {
                let conn = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| self.report(&e))?;
                tracing::info!(db = self.db(), "Redis connection established");
                Ok::<_, ConnectionError>(ReportingConnection::new(conn, &self.inner))
            })
            .await?;

        Ok(conn.clone())
    }

    /// Sends PING and checks the reply
    pub async fn ping(&self) -> ConnectResult<()> {
        let mut conn = self.multiplexed().await?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ConnectionError::from(&e))?;
        tracing::debug!(reply = %reply, "Redis PING");
        Ok(())
    }

    /// Requests a graceful close without waiting for it
    ///
    /// `QUIT` is queued behind any in-flight commands and sent from a spawned task.
    /// `Ok` only means the request was issued. Closing a handle that never reached the
    /// server just marks it closed.
    pub fn quit(&self) -> ConnectResult<()> {
        let runtime = tokio::runtime::Handle::try_current().ok();

        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(ConnectError::Closed);
        }
        fence(Ordering::SeqCst);

        let Some(conn) = self.inner.conn.get().cloned() else {
            tracing::debug!("Closing Redis handle that never connected");
            return Ok(());
        };

        let Some(runtime) = runtime else {
            self.inner.closed.store(false, Ordering::SeqCst);
            return Err(ConnectError::NoRuntime);
        };

        runtime.spawn(async move {
            if let Err(e) = send_quit(conn).await {
                tracing::warn!(error = %e, "Redis QUIT failed");
            }
        });
        tracing::info!("Redis close requested");

        Ok(())
    }

    /// Sends `QUIT` and waits for the server to acknowledge it
    pub async fn close(&self) -> ConnectResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(ConnectError::Closed);
        }

        let Some(conn) = self.inner.conn.get().cloned() else {
            tracing::debug!("Closing Redis handle that never connected");
            return Ok(());
        };

        send_quit(conn).await.map_err(|e| ConnectionError::from(&e))?;
        tracing::info!("Redis connection closed");
        Ok(())
    }

    fn report(&self, err: &redis::RedisError) -> ConnectionError {
        let err = ConnectionError::from(err);
        (self.inner.listener)(&err);
        err
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("db", &self.db())
            .field("connected", &self.inner.conn.initialized())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl std::fmt::Debug for ReportingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportingConnection")
            .field("db", &self.conn.get_db())
            .finish()
    }
}

async fn send_quit(mut conn: ReportingConnection) -> RedisResult<()> {
    let _: () = redis::cmd("QUIT").query_async(&mut conn).await?;
    Ok(())
}
