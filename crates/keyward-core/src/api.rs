// ABOUTME: Raw key pair service contract mirroring the platform's RPC shapes.
// ABOUTME: Implementations return backend error codes untouched; the store adapter maps them.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::KeyRecord;

/// Code the platform uses when a named key pair does not exist.
pub const NOT_FOUND_KEY_PAIR: &str = "Client.InvalidParameterNotFound.KeyPair";

/// Attribute name accepted by [`KeyPairApi::modify_key_pair_attribute`].
pub const ATTRIBUTE_DESCRIPTION: &str = "description";

/// A key pair as the service returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawKeyPair {
    pub key_name: String,
    pub key_fingerprint: String,
    /// Base64 private key, only set in create responses.
    pub key_material: Option<String>,
    pub description: Option<String>,
}

impl From<RawKeyPair> for KeyRecord {
    fn from(raw: RawKeyPair) -> Self {
        KeyRecord {
            name: raw.key_name,
            fingerprint: raw.key_fingerprint,
            private_key: raw.key_material,
            description: raw.description,
        }
    }
}

/// Errors surfaced by a service client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service answered with an error code.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The service could not be reached or the response was unreadable.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code),
            ApiError::Transport(_) => None,
        }
    }
}

/// Key pair RPCs of the remote compute platform.
///
/// Retries, backoff, and deadlines belong to implementations of this trait.
#[async_trait]
pub trait KeyPairApi: Send + Sync {
    /// Describe the named key pairs. Unknown names may yield either an empty
    /// list or a not-found error, depending on the service.
    async fn describe_key_pairs(&self, names: &[String]) -> Result<Vec<RawKeyPair>, ApiError>;

    /// Generate a key pair server-side; the response carries the private key.
    async fn create_key_pair(
        &self,
        name: &str,
        password: &str,
        description: &str,
    ) -> Result<RawKeyPair, ApiError>;

    /// Register caller-supplied base64 public key material.
    async fn import_key_pair(
        &self,
        name: &str,
        public_key_material: &str,
        description: &str,
    ) -> Result<RawKeyPair, ApiError>;

    async fn delete_key_pair(&self, name: &str) -> Result<(), ApiError>;

    /// Change a mutable attribute; only [`ATTRIBUTE_DESCRIPTION`] is used.
    async fn modify_key_pair_attribute(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_key_pair_into_record() {
        let raw = RawKeyPair {
            key_name: "k1".to_string(),
            key_fingerprint: "aa".to_string(),
            key_material: Some("UFJJVg==".to_string()),
            description: Some("d".to_string()),
        };
        let record: KeyRecord = raw.into();
        assert_eq!(record.name, "k1");
        assert_eq!(record.fingerprint, "aa");
        assert_eq!(record.private_key.as_deref(), Some("UFJJVg=="));
        assert_eq!(record.description.as_deref(), Some("d"));
    }

    #[test]
    fn test_api_error_code() {
        let err = ApiError::service(NOT_FOUND_KEY_PAIR, "gone");
        assert_eq!(err.code(), Some(NOT_FOUND_KEY_PAIR));
        assert_eq!(err.to_string(), format!("{}: gone", NOT_FOUND_KEY_PAIR));

        let err = ApiError::Transport("reset".to_string());
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("reset"));
    }
}
