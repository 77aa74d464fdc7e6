//! Authenticated connection to a MISP instance

pub mod export;
pub mod search;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use url::Url;

use crate::config::MispConfig;
use crate::error::{MispError, Result};
use crate::query::Query;
use crate::response::Response;

const CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Default bound on a whole request, TLS handshake and body included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transport scheme of a MISP instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = MispError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(MispError::UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport settings for a [`Connection`]
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Skip TLS certificate verification. Insecure: only for lab instances
    /// with self-signed certificates.
    pub insecure: bool,
    pub timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Search operations offered by a MISP instance
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Run an event or attribute search
    async fn search(&self, query: &Query) -> Result<Response>;

    /// Export attribute values as deduplicated plain-text lines
    async fn text_export(&self, flags: &[String]) -> Result<Vec<String>>;
}

/// Connection to a MISP instance, reusable across searches
#[derive(Clone)]
pub struct Connection {
    scheme: Scheme,
    host: String,
    api_key: String,
    client: Client,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Create a new connection verifying TLS certificates
    ///
    /// # Panics
    ///
    /// Panics if `scheme` is neither `http` nor `https`.
    pub fn new(scheme: &str, host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::build(scheme, host.into(), api_key.into(), ConnectionOptions::default())
    }

    /// Create a new connection that does NOT verify TLS certificates
    ///
    /// # Panics
    ///
    /// Panics if `scheme` is neither `http` nor `https`.
    pub fn new_insecure(scheme: &str, host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let options = ConnectionOptions {
            insecure: true,
            ..Default::default()
        };
        Self::build(scheme, host.into(), api_key.into(), options)
    }

    /// Create a connection from a loaded configuration
    pub fn from_config(config: &MispConfig) -> Result<Self> {
        let options = ConnectionOptions {
            insecure: config.insecure,
            timeout: Duration::from_secs(config.timeout_secs),
        };
        Self::with_options(
            config.protocol.parse()?,
            config.host.clone(),
            config.api_key.clone(),
            options,
        )
    }

    pub fn with_options(
        scheme: Scheme,
        host: impl Into<String>,
        api_key: impl Into<String>,
        options: ConnectionOptions,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .timeout(options.timeout);

        if options.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            scheme,
            host: host.into(),
            api_key: api_key.into(),
            client: builder.build()?,
        })
    }

    fn build(scheme: &str, host: String, api_key: String, options: ConnectionOptions) -> Self {
        let scheme = match scheme.parse::<Scheme>() {
            Ok(scheme) => scheme,
            Err(e) => {
                tracing::error!(error = %e, "Refusing to create MISP connection");
                panic!("{e}");
            }
        };

        match Self::with_options(scheme, host, api_key, options) {
            Ok(conn) => conn,
            Err(e) => panic!("Failed to create HTTP client: {e}"),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Join scheme, host and path segments into a URL.
    ///
    /// Each segment may hold several `/`-separated pieces; empty pieces are dropped.
    pub fn build_url<I, S>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = format!("{}://{}/", self.scheme, self.host.trim_matches('/'));
        let invalid = |reason: String| MispError::InvalidUrl {
            url: base.clone(),
            reason,
        };

        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| invalid("cannot be a base URL".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                for piece in segment.as_ref().split('/').filter(|p| !p.is_empty()) {
                    path.push(piece);
                }
            }
        }
        Ok(url)
    }

    /// Build a request carrying the API key and JSON content negotiation headers
    pub fn build_authenticated_request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT);

        match body {
            Some(body) => request.body(body),
            None => request,
        }
    }

    /// Send a request and reject anything but HTTP 200
    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            // keep the status even when the body cannot be read
            let message = match response.bytes().await {
                Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read MISP error body");
                    String::new()
                }
            };
            tracing::warn!(
                host = %self.host,
                status = status.as_u16(),
                "MISP rejected request"
            );
            return Err(MispError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Searcher for Connection {
    async fn search(&self, query: &Query) -> Result<Response> {
        Connection::search(self, query).await
    }

    async fn text_export(&self, flags: &[String]) -> Result<Vec<String>> {
        Connection::text_export(self, flags).await
    }
}
