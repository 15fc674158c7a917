use crate::{Error, Executor, Result};
use std::future::Future;
use url::Url;

pub trait Connection: Executor + Sized {
    /// Open a connection to the given url.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;
}

/// Parses a connection url, checking it uses the expected scheme.
pub fn parse_connection_url(url: &str, scheme: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| {
        Error::new(e).context(format!("Error while decoding connection URL: `{url}`"))
    })?;
    if parsed.scheme() != scheme {
        return Err(Error::msg(format!(
            "Expected the connection url to start with `{scheme}://`, found `{url}`"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_checked() {
        let url = parse_connection_url("sqlite://data.db?batch_size=10", "sqlite")
            .expect("Valid url");
        assert_eq!(url.query(), Some("batch_size=10"));
        assert!(parse_connection_url("postgres://localhost", "sqlite").is_err());
        assert!(parse_connection_url("not a url", "sqlite").is_err());
    }
}
