// ABOUTME: Configuration for the key pair store client and the reconciliation engine.
// ABOUTME: Merges explicit values over environment variables and loads TOML settings files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{KeywardError, Result};

pub const ACCESS_KEY_ID_ENV: &str = "KEYWARD_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "KEYWARD_SECRET_ACCESS_KEY";
pub const REGION_ENV: &str = "KEYWARD_DEFAULT_REGION";

/// Longest key pair name the remote side accepts.
pub const MAX_KEY_NAME_LEN: usize = 32;

/// Scratch names keep at least this many random characters after the prefix.
pub const MIN_SCRATCH_SUFFIX_LEN: usize = 16;

pub const DEFAULT_SCRATCH_PREFIX: &str = "keyward";
pub const DEFAULT_MAX_SCRATCH_ATTEMPTS: u32 = 8;

/// Credentials and region for the remote key pair service.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
}

impl ClientConfig {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            region: Some(region.into()),
        }
    }

    /// Fill unset fields from the environment (and a `.env` file, if present).
    pub fn resolve(self) -> Self {
        self.resolve_with(|key| dotenvy::var(key).ok())
    }

    /// Fill unset fields from `lookup`. Explicit values always win; empty
    /// values from the lookup count as unset.
    pub fn resolve_with<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            access_key_id: self.access_key_id.or_else(|| env_value(ACCESS_KEY_ID_ENV)),
            secret_access_key: self
                .secret_access_key
                .or_else(|| env_value(SECRET_ACCESS_KEY_ENV)),
            region: self.region.or_else(|| env_value(REGION_ENV)),
        }
    }

    /// Reject a credential pair with only one half set.
    pub fn validate(&self) -> Result<()> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(KeywardError::Config(format!(
                "access key id is set but secret access key is missing (set {})",
                SECRET_ACCESS_KEY_ENV
            ))),
            (None, Some(_)) => Err(KeywardError::Config(format!(
                "secret access key is set but access key id is missing (set {})",
                ACCESS_KEY_ID_ENV
            ))),
            _ => Ok(()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .finish()
    }
}

/// How scratch key pairs for fingerprint probing are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Fixed namespace prefix; the rest of the name is random hex.
    pub prefix: String,
    /// How many candidate names to try before giving up.
    pub max_attempts: u32,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_SCRATCH_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_SCRATCH_ATTEMPTS,
        }
    }
}

impl ScratchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() || !self.prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(KeywardError::Config(format!(
                "scratch prefix '{}' must be non-empty ASCII alphanumerics",
                self.prefix
            )));
        }
        if self.prefix.len() > MAX_KEY_NAME_LEN - MIN_SCRATCH_SUFFIX_LEN {
            return Err(KeywardError::Config(format!(
                "scratch prefix '{}' leaves fewer than {} random characters",
                self.prefix, MIN_SCRATCH_SUFFIX_LEN
            )));
        }
        if self.max_attempts == 0 {
            return Err(KeywardError::Config(
                "scratch max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Report what would change without issuing any mutating call.
    pub check_mode: bool,
    pub scratch: ScratchConfig,
}

impl EngineConfig {
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn with_scratch(mut self, scratch: ScratchConfig) -> Self {
        self.scratch = scratch;
        self
    }
}

/// Everything a caller needs to build a store and an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub engine: EngineConfig,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeywardError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| KeywardError::Config(format!("failed to parse settings: {}", e)))
    }

    /// Merge the environment into the client section and validate everything.
    pub fn resolve(self) -> Result<Self> {
        self.resolve_with(|key| dotenvy::var(key).ok())
    }

    pub fn resolve_with<F>(self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Self {
            client: self.client.resolve_with(lookup),
            engine: self.engine,
        };
        settings.client.validate()?;
        settings.engine.scratch.validate()?;
        Ok(settings)
    }
}
