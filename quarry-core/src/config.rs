use crate::{Error, IsolationLevel, Result};
use std::{str::FromStr, time::Duration};
use url::Url;

/// What an update does when the stored row changed after the object was loaded.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Refuse the update with [`crate::ErrorKind::Concurrency`].
    #[default]
    Fail,
    /// Overwrite the stored row.
    Ignore,
}

impl FromStr for ConcurrencyMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ConcurrencyMode::Fail),
            "ignore" => Ok(ConcurrencyMode::Ignore),
            _ => Err(Error::msg(format!("Unknown concurrency mode `{s}`"))),
        }
    }
}

/// Session settings.
///
/// | key | default |
/// |---|---|
/// | `command_timeout` (seconds, 0 disables) | 30 |
/// | `batch_size` | 100 |
/// | `concurrency` (`fail` or `ignore`) | `fail` |
/// | `isolation` | `read_committed` |
/// | `parallel_compile` | `true` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command_timeout: Option<Duration>,
    /// Maximum rows per command of the batch operations.
    pub batch_size: usize,
    pub concurrency: ConcurrencyMode,
    /// Isolation of the transactions started without an explicit level.
    pub isolation: IsolationLevel,
    /// Compile the chunks of a batch on a thread pool.
    pub parallel_compile: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout: Some(Duration::from_secs(30)),
            batch_size: 100,
            concurrency: ConcurrencyMode::Fail,
            isolation: IsolationLevel::ReadCommitted,
            parallel_compile: true,
        }
    }
}

impl Config {
    /// Reads the settings from the query string of a connection url, unknown keys belong to
    /// the driver and are skipped.
    pub fn from_url(url: &Url) -> Result<Self> {
        let mut config = Config::default();
        for (key, value) in url.query_pairs() {
            let context = || format!("Invalid value `{value}` for `{key}` in the connection url");
            match key.as_ref() {
                "command_timeout" => {
                    let seconds: u64 = value.parse().map_err(|e| Error::new(e).context(context()))?;
                    config.command_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
                }
                "batch_size" => {
                    let size: usize = value.parse().map_err(|e| Error::new(e).context(context()))?;
                    if size == 0 {
                        return Err(Error::msg(context()));
                    }
                    config.batch_size = size;
                }
                "concurrency" => {
                    config.concurrency = value.parse().map_err(|e: Error| e.context(context()))?;
                }
                "isolation" => {
                    config.isolation = value.parse().map_err(|e: Error| e.context(context()))?;
                }
                "parallel_compile" => {
                    config.parallel_compile =
                        value.parse().map_err(|e| Error::new(e).context(context()))?;
                }
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_parallel_compile(mut self, parallel_compile: bool) -> Self {
        self.parallel_compile = parallel_compile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_query() {
        let url = Url::parse(
            "sqlite://data.db?command_timeout=0&batch_size=50&concurrency=ignore&isolation=serializable&mode=rwc",
        )
        .expect("Valid url");
        let config = Config::from_url(&url).expect("Valid config");
        assert_eq!(
            config,
            Config {
                command_timeout: None,
                batch_size: 50,
                concurrency: ConcurrencyMode::Ignore,
                isolation: IsolationLevel::Serializable,
                parallel_compile: true,
            }
        );
        let url = Url::parse("sqlite://data.db?batch_size=0").expect("Valid url");
        assert!(Config::from_url(&url).is_err());
        let url = Url::parse("sqlite://data.db?concurrency=maybe").expect("Valid url");
        assert!(Config::from_url(&url).is_err());
    }
}
