//! Environment configuration for acceptance runs.
//!
//! | Variable                 | Purpose                                       |
//! |--------------------------|-----------------------------------------------|
//! | `TF_ACC`                 | Enables live acceptance tests when non-empty  |
//! | `SNYK_TOKEN`             | API token for the remote service              |
//! | `SNYK_API_URL`           | API endpoint, defaults to the public endpoint |
//! | `SNYK_GROUP_ID`          | Group new organizations are created under     |
//! | `TF_ACC_TERRAFORM_PATH`  | `terraform` binary, defaults to `PATH` lookup |
//! | `TF_ACC_PROVIDER_SOURCE` | Registry source of the provider under test    |

use crate::client::ClientConfig;
use crate::client::http::DEFAULT_ENDPOINT;
use std::path::PathBuf;

pub const ENV_ACC: &str = "TF_ACC";
pub const ENV_TOKEN: &str = "SNYK_TOKEN";
pub const ENV_ENDPOINT: &str = "SNYK_API_URL";
pub const ENV_GROUP_ID: &str = "SNYK_GROUP_ID";
pub const ENV_TERRAFORM_PATH: &str = "TF_ACC_TERRAFORM_PATH";
pub const ENV_PROVIDER_SOURCE: &str = "TF_ACC_PROVIDER_SOURCE";

/// Registry address of the provider that owns the `snyk_*` resources.
pub const DEFAULT_PROVIDER_SOURCE: &str = "pavel-snyk/snyk";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{variable} must be set for acceptance tests")]
    MissingVariable { variable: &'static str },
}

/// Settings for one acceptance run.
#[derive(Clone)]
pub struct AccSettings {
    pub acceptance: bool,
    pub token: Option<String>,
    pub endpoint: String,
    pub group_id: Option<String>,
    pub terraform_path: PathBuf,
    pub provider_source: String,
}

impl Default for AccSettings {
    fn default() -> Self {
        Self {
            acceptance: false,
            token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            group_id: None,
            terraform_path: PathBuf::from("terraform"),
            provider_source: DEFAULT_PROVIDER_SOURCE.to_string(),
        }
    }
}

impl std::fmt::Debug for AccSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccSettings")
            .field("acceptance", &self.acceptance)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("group_id", &self.group_id)
            .field("terraform_path", &self.terraform_path)
            .field("provider_source", &self.provider_source)
            .finish()
    }
}

impl AccSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = Self::default();

        Self {
            acceptance: get(ENV_ACC).is_some(),
            token: get(ENV_TOKEN),
            endpoint: get(ENV_ENDPOINT).unwrap_or(defaults.endpoint),
            group_id: get(ENV_GROUP_ID),
            terraform_path: get(ENV_TERRAFORM_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.terraform_path),
            provider_source: get(ENV_PROVIDER_SOURCE).unwrap_or(defaults.provider_source),
        }
    }

    /// Whether live acceptance tests should run.
    pub fn acceptance_enabled(&self) -> bool {
        self.acceptance
    }

    /// Fail unless the variables a live run needs are present.
    pub fn pre_check(&self) -> Result<(), SettingsError> {
        if self.token.is_none() {
            return Err(SettingsError::MissingVariable {
                variable: ENV_TOKEN,
            });
        }
        if self.group_id.is_none() {
            return Err(SettingsError::MissingVariable {
                variable: ENV_GROUP_ID,
            });
        }
        Ok(())
    }

    /// Group id, empty when unset.
    pub fn group_id(&self) -> &str {
        self.group_id.as_deref().unwrap_or_default()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.token.clone().unwrap_or_default()).with_endpoint(self.endpoint.clone())
    }

    /// Environment the `terraform` process needs for the provider to reach
    /// the same remote.
    pub fn provider_env(&self) -> Vec<(String, String)> {
        let mut env = vec![(ENV_ENDPOINT.to_string(), self.endpoint.clone())];
        if let Some(token) = &self.token {
            env.push((ENV_TOKEN.to_string(), token.clone()));
        }
        env
    }
}
