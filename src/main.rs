use redis_connect::Connector;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Redis smoke check failed");
        std::process::exit(1);
    }
}

/// Connects with the first argument (or `REDIS_URL`), pings, and closes
async fn run() -> anyhow::Result<()> {
    let url = std::env::args().nth(1);
    let connector = Connector::from_env()?;

    let conn = connector.connect(url.as_deref())?;
    tracing::info!(db = conn.db(), "Connecting to Redis");

    conn.ping().await?;
    tracing::info!("Redis answered PING");

    conn.close().await?;

    Ok(())
}
