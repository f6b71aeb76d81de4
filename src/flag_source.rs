//! Sources of flag definitions used to refresh a client.
use std::path::PathBuf;

use reqwest::{StatusCode, Url};

use crate::{
    flag_store::FlagStore,
    flags::{parse_flags, FeatureFlag, FlagSet},
    Error, Result,
};

/// Produces a complete list of flag definitions.
///
/// A failed fetch must not have side effects: the client keeps its current flags.
pub trait FlagSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<FeatureFlag>>;
}

/// A fixed list of flags.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagSource(pub Vec<FeatureFlag>);

impl FlagSource for StaticFlagSource {
    fn fetch(&self) -> Result<Vec<FeatureFlag>> {
        Ok(self.0.clone())
    }
}

/// Reads a JSON document of flags from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileFlagSource {
    path: PathBuf,
}

impl FileFlagSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFlagSource { path: path.into() }
    }
}

impl FlagSource for FileFlagSource {
    fn fetch(&self) -> Result<Vec<FeatureFlag>> {
        log::debug!(target: "flagset", path:debug = self.path; "reading flags from file");
        let json = std::fs::read(&self.path)?;
        parse_flags(&json)
    }
}

/// Fetches a JSON document of flags from a remote configuration service.
pub struct HttpFlagSource {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    url: Url,
    api_key: Option<String>,
}

impl HttpFlagSource {
    /// User agent sent with every request.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(Error::InvalidUrl)?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(Self::DEFAULT_USER_AGENT)
            .build()?;
        Ok(HttpFlagSource {
            client,
            url,
            api_key: None,
        })
    }

    /// Send `api_key` as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl FlagSource for HttpFlagSource {
    fn fetch(&self) -> Result<Vec<FeatureFlag>> {
        log::debug!(target: "flagset", url:display = self.url; "fetching flags");

        let mut request = self.client.get(self.url.clone());
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?.error_for_status().map_err(|err| {
            if err.status() == Some(StatusCode::UNAUTHORIZED) {
                log::warn!(target: "flagset", "flag source rejected the request. Check your API key");
                Error::Unauthorized
            } else {
                log::warn!(target: "flagset", "received non-200 response while fetching flags: {:?}", err);
                Error::from(err)
            }
        })?;

        let body = response.bytes()?;
        parse_flags(&body)
    }
}

/// Fetch flags from `source` and swap them into `store`. All-or-nothing: on any error the store
/// is left untouched. Returns the number of flags now active.
pub(crate) fn refresh_store(store: &FlagStore, source: &dyn FlagSource) -> Result<usize> {
    let flags = FlagSet::new(source.fetch()?)?;
    let count = flags.len();
    store.replace_all(flags);
    log::info!(target: "flagset", flag_count = count; "refreshed feature flags");
    Ok(count)
}
