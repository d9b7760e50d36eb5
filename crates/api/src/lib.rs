//! Platform API client utilities.
//!
//! This crate provides a lightweight client for the platform's v3 REST API.
//! It focuses on:
//!
//! - Discovering the logged-in session from the platform CLI's config file
//! - Validating the API endpoint for safety
//! - Constructing an HTTP client with the session's bearer token, TLS
//!   preference and a fixed request timeout
//! - Resolving API-relative paths, rebasing absolute links onto the endpoint
//!
//! The primary entry point is [`CfClient`]. Load a [`Session`], create a
//! client via [`CfClient::new`], and then build requests with
//! [`CfClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use panzer_api::{CfClient, ClientSettings, Session};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let session = Session::load()?;
//!     let client = CfClient::new(&session, &ClientSettings::default())?;
//!     let res = client.request(reqwest::Method::GET, "/v3/apps")?.send().await?;
//!     println!("status: {}", res.status());
//!     Ok(())
//! }
//! ```

pub mod session;

pub use session::{Session, SessionError, Target, TargetRef};

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, header};
use tracing::{debug, warn};
use url::Url;

/// Default per-request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Tunables for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for platform API access.
///
/// The client pre-configures the authorization and content headers and
/// builds requests against a validated base URL.
pub struct CfClient {
    pub base_url: Url,
    pub http: Client,
    pub user_agent: String,
}

impl CfClient {
    /// Construct a [`CfClient`] for the API endpoint of a session.
    ///
    /// Non-localhost endpoints must use HTTPS. TLS certificate verification
    /// is disabled only when the session was created with
    /// `--skip-ssl-validation`.
    pub fn new(session: &Session, settings: &ClientSettings) -> Result<Self> {
        let base_url = validate_base_url(&session.api_endpoint)?;

        let mut default_headers = header::HeaderMap::new();
        let mut authorization = header::HeaderValue::from_str(&session.authorization_header())
            .context("access token is not a valid header value")?;
        authorization.set_sensitive(true);
        default_headers.insert(header::AUTHORIZATION, authorization);
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        default_headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(session.skip_ssl_validation)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("panzer/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Resolve an API-relative path or an absolute link into a URL.
    ///
    /// Links are built from the controller's own external domain, which may
    /// differ from the targeted endpoint. A link to another origin keeps its
    /// path and query but is rebased onto the base URL.
    pub fn resolve_url(&self, path_or_url: &str) -> Result<Url> {
        if is_absolute_link(path_or_url) {
            let url = Url::parse(path_or_url).map_err(|e| anyhow!("Invalid link '{}': {}", path_or_url, e))?;
            if url.origin() == self.base_url.origin() {
                return Ok(url);
            }
            let mut rebased = self.base_url.clone();
            rebased.set_path(url.path());
            rebased.set_query(url.query());
            warn!(link = %url, rebased = %rebased, "link points outside of the API endpoint, rebasing");
            return Ok(rebased);
        }

        let relative = path_or_url.trim_start_matches('/');
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(relative)
            .map_err(|e| anyhow!("Invalid API path '{}': {}", path_or_url, e))
    }

    /// True when `link` is relative or points at the API endpoint's origin.
    pub fn is_api_link(&self, link: &str) -> bool {
        if !is_absolute_link(link) {
            return true;
        }
        Url::parse(link).is_ok_and(|url| url.origin() == self.base_url.origin())
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path
    /// or absolute link.
    pub fn request(&self, method: reqwest::Method, path_or_url: &str) -> Result<RequestBuilder> {
        let url = self.resolve_url(path_or_url)?;
        debug!(%url, %method, "building request");

        Ok(self
            .http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent))
    }
}

fn is_absolute_link(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://")
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
pub fn validate_base_url(base: &str) -> Result<Url> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid API endpoint URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("API endpoint '{}' must include a host", base))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(parsed_base_url);
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "API endpoint must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(parsed_base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(endpoint: &str) -> Session {
        Session {
            config_path: None,
            access_token: "bearer abc.def.ghi".into(),
            api_endpoint: endpoint.into(),
            skip_ssl_validation: false,
            organization: None,
            space: None,
        }
    }

    fn api_client(endpoint: &str) -> CfClient {
        CfClient::new(&session(endpoint), &ClientSettings::default()).expect("client")
    }

    #[test]
    fn validate_base_url_rules() {
        assert!(validate_base_url("https://api.sys.example.com").is_ok());
        assert!(validate_base_url("http://localhost:9022").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_base_url("http://api.sys.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn resolves_relative_paths_against_base() {
        let client = api_client("https://api.sys.example.com");
        let url = client.resolve_url("/v3/apps?per_page=1000").expect("url");
        assert_eq!(url.as_str(), "https://api.sys.example.com/v3/apps?per_page=1000");
    }

    #[test]
    fn keeps_base_path_prefix() {
        let client = CfClient::new(&session("https://example.com/cf"), &ClientSettings::default()).expect("client");
        let url = client.resolve_url("/v3/spaces/abc").expect("url");
        assert_eq!(url.as_str(), "https://example.com/cf/v3/spaces/abc");
    }

    #[test]
    fn rebases_foreign_links_onto_the_endpoint() {
        let client = api_client("https://api.sys.example.com");
        let stats = client
            .resolve_url("https://api.sys.example.com/v3/processes/p1/stats")
            .expect("same origin");
        assert_eq!(stats.as_str(), "https://api.sys.example.com/v3/processes/p1/stats");
        assert!(client.is_api_link("https://api.sys.example.com/v3/apps"));
        assert!(client.is_api_link("/v3/apps"));

        let foreign = client
            .resolve_url("http://cloud-controller.internal:9022/v3/apps?page=2&per_page=50")
            .expect("rebased");
        assert_eq!(foreign.as_str(), "https://api.sys.example.com/v3/apps?page=2&per_page=50");
        assert!(!client.is_api_link("https://evil.example.net/v3/processes/p1/stats"));
    }
}
