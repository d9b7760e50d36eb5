//! Session discovery from the platform CLI's on-disk configuration.
//!
//! The platform CLI keeps the logged-in session in `$CF_HOME/.cf/config.json`
//! (falling back to the user's home directory). Panzer reads the bearer
//! token, the API endpoint, the TLS verification flag and the currently
//! targeted org and space from that file, and writes the target back when a
//! report asks to switch it.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dirs_next::home_dir;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the directory that holds `.cf/config.json`.
pub const CF_HOME_ENV: &str = "CF_HOME";

const CONFIG_DIR_NAME: &str = ".cf";
const CONFIG_FILE_NAME: &str = "config.json";
const UNKNOWN_USER: &str = "unknown user";

/// Errors surfaced while reading or updating the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Use 'cf login' to log in.")]
    NotLoggedIn,

    #[error("please target your org/space first")]
    NoOrgTargeted,

    #[error("please target your space first")]
    NoSpaceTargeted,

    #[error("failed to access session config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("session is not backed by a config file")]
    Detached,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "AccessToken", default)]
    access_token: Option<String>,
    #[serde(rename = "Target", default)]
    target: Option<String>,
    #[serde(rename = "SSLDisabled", default)]
    ssl_disabled: Option<bool>,
    #[serde(rename = "OrganizationFields", default)]
    organization_fields: Option<RawTargetFields>,
    #[serde(rename = "SpaceFields", default)]
    space_fields: Option<RawTargetFields>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTargetFields {
    #[serde(rename = "GUID", default)]
    guid: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

impl RawTargetFields {
    fn into_target(self) -> Option<TargetRef> {
        let guid = self.guid.unwrap_or_default();
        if guid.trim().is_empty() {
            return None;
        }
        Some(TargetRef {
            guid,
            name: self.name.unwrap_or_default(),
        })
    }
}

/// An org or space the session currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub guid: String,
    pub name: String,
}

impl TargetRef {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}

/// Borrowed view of a fully targeted session.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub organization: &'a TargetRef,
    pub space: &'a TargetRef,
}

/// The logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    /// File the session was read from, if any.
    pub config_path: Option<PathBuf>,
    pub access_token: String,
    pub api_endpoint: String,
    pub skip_ssl_validation: bool,
    pub organization: Option<TargetRef>,
    pub space: Option<TargetRef>,
}

impl Session {
    /// Load the session from the default config location.
    pub fn load() -> Result<Self, SessionError> {
        Self::load_from(&default_config_path())
    }

    /// Load the session from an explicit config file.
    ///
    /// A missing file means the user never logged in.
    pub fn load_from(path: &Path) -> Result<Self, SessionError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Err(SessionError::NotLoggedIn),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let mut session = Self::from_config_str(&content)?;
        session.config_path = Some(path.to_path_buf());
        debug!(path = %path.display(), api = %session.api_endpoint, "session loaded");
        Ok(session)
    }

    /// Build a session from the JSON content of a config file.
    pub fn from_config_str(content: &str) -> Result<Self, SessionError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        let access_token = raw.access_token.unwrap_or_default().trim().to_string();
        let api_endpoint = raw.target.unwrap_or_default().trim().trim_end_matches('/').to_string();
        if access_token.is_empty() || api_endpoint.is_empty() {
            return Err(SessionError::NotLoggedIn);
        }

        Ok(Self {
            config_path: None,
            access_token,
            api_endpoint,
            skip_ssl_validation: raw.ssl_disabled.unwrap_or(false),
            organization: raw.organization_fields.and_then(RawTargetFields::into_target),
            space: raw.space_fields.and_then(RawTargetFields::into_target),
        })
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        if bearer_token(&self.access_token).is_some() {
            self.access_token.clone()
        } else {
            format!("Bearer {}", self.access_token)
        }
    }

    /// Name of the logged-in user taken from the access token claims.
    pub fn username(&self) -> String {
        token_username(&self.access_token).unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    /// Returns the targeted org and space, or the reason there is none.
    pub fn require_target(&self) -> Result<Target<'_>, SessionError> {
        let organization = self.organization.as_ref().ok_or(SessionError::NoOrgTargeted)?;
        let space = self.space.as_ref().ok_or(SessionError::NoSpaceTargeted)?;
        Ok(Target { organization, space })
    }

    /// Point the session at another org and space and persist the change.
    ///
    /// The org and space entries of the config file are replaced whole, which
    /// drops details of the previous target; every other key is written back
    /// untouched.
    pub fn switch_target(&mut self, organization: TargetRef, space: TargetRef) -> Result<(), SessionError> {
        let path = self.config_path.clone().ok_or(SessionError::Detached)?;
        let io_error = |source| SessionError::Io {
            path: path.clone(),
            source,
        };

        let content = fs::read_to_string(&path).map_err(io_error)?;
        let mut config: Map<String, Value> = serde_json::from_str(&content)?;
        config.insert(
            "OrganizationFields".into(),
            json!({ "GUID": organization.guid, "Name": organization.name }),
        );
        config.insert("SpaceFields".into(), json!({ "GUID": space.guid, "Name": space.name }));
        let data = serde_json::to_string_pretty(&Value::Object(config))?;
        fs::write(&path, data).map_err(io_error)?;

        debug!(org = %organization.name, space = %space.name, "session target switched");
        self.organization = Some(organization);
        self.space = Some(space);
        Ok(())
    }
}

/// Path of the platform CLI config file, honouring `CF_HOME`.
pub fn default_config_path() -> PathBuf {
    let base = env::var(CF_HOME_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

fn bearer_token(token: &str) -> Option<&str> {
    let (scheme, rest) = token.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(rest.trim())
}

/// Extract `user_name` (or `email`) from the JWT payload of an access token.
fn token_username(token: &str) -> Option<String> {
    let jwt = bearer_token(token).unwrap_or(token);
    let payload = jwt.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    ["user_name", "email"]
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
