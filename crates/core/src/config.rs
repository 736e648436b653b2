//! Client configuration (environment-driven).
//!
//! Every setting has a development default so a client can start with an
//! empty environment. Values are read through a lookup function, which keeps
//! tests away from the process environment.

use std::path::PathBuf;

use http::Uri;

use crate::error::ConfigError;

pub const DEFAULT_TOKEN_KEY: &str = "access_token";
pub const DEFAULT_LOG_FILTER: &str = "info";

const ENV_TOKEN_KEY: &str = "CAMPUSGATE_TOKEN_KEY";
const ENV_STORAGE_DIR: &str = "CAMPUSGATE_STORAGE_DIR";
const ENV_LOG: &str = "CAMPUSGATE_LOG";

/// One backend service origin (scheme + authority, optional base path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOrigin {
    uri: Uri,
}

impl ServiceOrigin {
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidUrl {
            key: key.to_string(),
            value: value.to_string(),
        };

        let uri: Uri = value.trim().parse().map_err(|_| invalid())?;
        match uri.scheme_str() {
            Some("http") | Some("https") => {}
            _ => return Err(invalid()),
        }
        if uri.authority().is_none() {
            return Err(invalid());
        }

        Ok(Self { uri })
    }

    /// Join an endpoint path onto this origin.
    pub fn url(&self, path: &str) -> String {
        let base = self.uri.to_string();
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Whether `uri` is addressed to this origin (same scheme and authority).
    pub fn serves(&self, uri: &Uri) -> bool {
        uri.scheme_str() == self.uri.scheme_str() && uri.authority() == self.uri.authority()
    }
}

/// Origins of the backend services the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub login: ServiceOrigin,
    pub students: ServiceOrigin,
    pub teachers: ServiceOrigin,
    pub admin: ServiceOrigin,
    pub groups: ServiceOrigin,
    pub grades: ServiceOrigin,
}

impl ApiEndpoints {
    const SERVICES: [(&'static str, &'static str); 6] = [
        ("CAMPUSGATE_LOGIN_URL", "http://localhost:5000"),
        ("CAMPUSGATE_STUDENTS_URL", "http://localhost:5001"),
        ("CAMPUSGATE_TEACHERS_URL", "http://localhost:5002"),
        ("CAMPUSGATE_ADMIN_URL", "http://localhost:5003"),
        ("CAMPUSGATE_GROUPS_URL", "http://localhost:5003"),
        ("CAMPUSGATE_GRADES_URL", "http://localhost:5005"),
    ];

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let origin = |idx: usize| {
            let (key, default) = Self::SERVICES[idx];
            let value = lookup(key).unwrap_or_else(|| default.to_string());
            ServiceOrigin::parse(key, &value)
        };

        Ok(Self {
            login: origin(0)?,
            students: origin(1)?,
            teachers: origin(2)?,
            admin: origin(3)?,
            groups: origin(4)?,
            grades: origin(5)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceOrigin> {
        [
            &self.login,
            &self.students,
            &self.teachers,
            &self.admin,
            &self.groups,
            &self.grades,
        ]
        .into_iter()
    }

    /// Whether a request to `uri` goes to one of the configured services.
    pub fn targets_backend(&self, uri: &Uri) -> bool {
        self.iter().any(|origin| origin.serves(uri))
    }
}

/// Full client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Name of the persistent slot holding the session token.
    pub token_key: String,
    /// Directory for the file-backed key-value storage.
    pub storage_dir: PathBuf,
    pub endpoints: ApiEndpoints,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl ClientConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_key = match lookup(ENV_TOKEN_KEY) {
            Some(key) if key.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    key: ENV_TOKEN_KEY.to_string(),
                });
            }
            Some(key) => key.trim().to_string(),
            None => DEFAULT_TOKEN_KEY.to_string(),
        };

        let storage_dir = match lookup(ENV_STORAGE_DIR) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => default_storage_dir()?,
        };

        let log_filter = lookup(ENV_LOG)
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            token_key,
            storage_dir,
            endpoints: ApiEndpoints::from_lookup(&lookup)?,
            log_filter,
        })
    }
}

fn default_storage_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(ConfigError::NoStorageDir)?;

    tracing::debug!(dir = %base.display(), "using platform data directory for storage");
    Ok(base.join("campusgate"))
}
