use std::sync::Once;

use serde::Deserialize;

use crate::error::{ConnectError, ConnectResult};

/// URL used when neither an explicit URL nor `REDIS_URL` is available
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

static DOTENV: Once = Once::new();

/// Connection settings loaded from environment variables
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Redis connection URL (`REDIS_URL`)
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Settings {
    /// Settings with a fixed default URL, bypassing the environment
    pub fn with_url(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(redis_url.into()),
        }
    }

    /// Load settings from environment variables
    ///
    /// A `.env` file in the working directory is loaded once per process, if present.
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> ConnectResult<Self> {
        DOTENV.call_once(|| {
            dotenvy::dotenv().ok();
        });

        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::from_vars(vars)
    }

    /// Load settings from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> ConnectResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Settings>(vars).map_err(|e| ConnectError::Config(e.to_string()))
    }
}

/// Picks the URL to connect with
///
/// The first candidate that is not blank wins: `explicit`, then `settings.redis_url`,
/// then [`DEFAULT_REDIS_URL`]. The winner is returned untrimmed.
pub fn resolve_url(explicit: Option<&str>, settings: &Settings) -> String {
    [explicit, settings.redis_url.as_deref()]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
        .unwrap_or(DEFAULT_REDIS_URL)
        .to_string()
}
