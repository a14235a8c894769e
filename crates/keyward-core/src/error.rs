// ABOUTME: Error taxonomy for key pair reconciliation using thiserror.
// ABOUTME: Classifies failures by kind and keeps the raw backend payload for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of everything that can go wrong during a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed key pair does not exist. Only used inside the store adapter.
    NotFound,
    /// The backend rejected the key pair name as malformed.
    InvalidName,
    /// The backend rejected a password or public key material.
    InvalidCredentialMaterial,
    /// Any other error reported by the backend.
    UnknownClientError,
    /// The backend could not be reached.
    TransportError,
    /// A scratch key pair could not be cleaned up.
    ResourceLeak,
    /// Every generated scratch name was already taken.
    ScratchNamesExhausted,
    /// The caller's request was inconsistent or unreadable.
    InvalidRequest,
    /// Configuration could not be loaded or was incomplete.
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::InvalidCredentialMaterial => "invalid_credential_material",
            ErrorKind::UnknownClientError => "unknown_client_error",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::ResourceLeak => "resource_leak",
            ErrorKind::ScratchNamesExhausted => "scratch_names_exhausted",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote call that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Describe,
    Create,
    Import,
    Delete,
    ModifyAttribute,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Describe => "describe",
            Operation::Create => "create",
            Operation::Import => "import",
            Operation::Delete => "delete",
            Operation::ModifyAttribute => "modify attribute",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw error payload as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFault {
    pub code: String,
    pub message: String,
}

impl BackendFault {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Errors that abort a reconciliation.
#[derive(Error, Debug)]
pub enum KeywardError {
    /// Backend rejected the key pair name.
    #[error("key pair name '{name}' rejected during {operation}: {fault}")]
    InvalidName {
        name: String,
        operation: Operation,
        fault: BackendFault,
    },

    /// Backend rejected the password or public key material.
    #[error("credential material for '{name}' rejected during {operation}: {fault}")]
    InvalidCredentialMaterial {
        name: String,
        operation: Operation,
        fault: BackendFault,
    },

    /// Any other backend-reported error.
    #[error("{operation} failed for '{name}': {fault}")]
    UnknownClient {
        name: String,
        operation: Operation,
        fault: BackendFault,
    },

    /// Network or transport failure surfaced by the backend client.
    #[error("transport failure during {operation} for '{name}': {message}")]
    Transport {
        name: String,
        operation: Operation,
        message: String,
    },

    /// No unused scratch name was found within the attempt budget.
    #[error("no unused scratch key pair name found after {attempts} attempts")]
    ScratchNamesExhausted { attempts: u32 },

    /// The existing key pair was deleted but the replacement import failed.
    /// The key pair is now absent; re-running the same request recreates it.
    #[error("key pair '{name}' was deleted but re-import failed: {source}")]
    PartialReplace {
        name: String,
        #[source]
        source: Box<KeywardError>,
        /// Conditions raised before the failure, such as a leaked scratch key pair.
        warnings: Vec<Warning>,
    },

    /// A failure that followed non-fatal conditions the caller must still see.
    #[error("{source} ({} warning(s) raised before the failure)", .warnings.len())]
    WithWarnings {
        #[source]
        source: Box<KeywardError>,
        warnings: Vec<Warning>,
    },

    /// Caller parameters were inconsistent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Public key material supplied by the caller could not be read.
    #[error("failed to read public key material: {0}")]
    Material(#[from] keyward_ssh::SshError),

    /// Configuration could not be loaded or was incomplete.
    #[error("config error: {0}")]
    Config(String),
}

impl KeywardError {
    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeywardError::InvalidName { .. } => ErrorKind::InvalidName,
            KeywardError::InvalidCredentialMaterial { .. } => ErrorKind::InvalidCredentialMaterial,
            KeywardError::UnknownClient { .. } => ErrorKind::UnknownClientError,
            KeywardError::Transport { .. } => ErrorKind::TransportError,
            KeywardError::ScratchNamesExhausted { .. } => ErrorKind::ScratchNamesExhausted,
            KeywardError::PartialReplace { source, .. }
            | KeywardError::WithWarnings { source, .. } => source.kind(),
            KeywardError::InvalidRequest(_) | KeywardError::Material(_) => {
                ErrorKind::InvalidRequest
            }
            KeywardError::Config(_) => ErrorKind::Config,
        }
    }

    /// The raw backend payload, when the backend reported one.
    pub fn fault(&self) -> Option<&BackendFault> {
        match self {
            KeywardError::InvalidName { fault, .. }
            | KeywardError::InvalidCredentialMaterial { fault, .. }
            | KeywardError::UnknownClient { fault, .. } => Some(fault),
            KeywardError::PartialReplace { source, .. }
            | KeywardError::WithWarnings { source, .. } => source.fault(),
            _ => None,
        }
    }

    /// Non-fatal conditions raised before this error, such as leaked scratch key pairs.
    pub fn warnings(&self) -> &[Warning] {
        match self {
            KeywardError::PartialReplace { warnings, .. }
            | KeywardError::WithWarnings { warnings, .. } => warnings,
            _ => &[],
        }
    }

    /// Attach `warnings` to this error. An empty list leaves it unchanged.
    pub fn with_warnings(self, mut warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            return self;
        }
        match self {
            KeywardError::PartialReplace {
                name,
                source,
                warnings: mut existing,
            } => {
                existing.append(&mut warnings);
                KeywardError::PartialReplace {
                    name,
                    source,
                    warnings: existing,
                }
            }
            KeywardError::WithWarnings {
                source,
                warnings: mut existing,
            } => {
                existing.append(&mut warnings);
                KeywardError::WithWarnings {
                    source,
                    warnings: existing,
                }
            }
            other => KeywardError::WithWarnings {
                source: Box::new(other),
                warnings,
            },
        }
    }
}

/// Result type alias using KeywardError.
pub type Result<T> = std::result::Result<T, KeywardError>;

/// Non-fatal condition reported alongside a successful outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: ErrorKind,
    /// Name of the remote resource the warning is about.
    pub resource: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<BackendFault>,
}

impl Warning {
    /// A scratch key pair survived because its delete failed.
    pub fn resource_leak(resource: &str, error: &KeywardError) -> Self {
        Self {
            kind: ErrorKind::ResourceLeak,
            resource: resource.to_string(),
            detail: format!("scratch key pair could not be deleted: {}", error),
            fault: error.fault().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn unknown_fault() -> BackendFault {
        BackendFault::new("Server.InternalError", "try again later")
    }

    #[test]
    fn test_invalid_name_display() {
        let err = KeywardError::InvalidName {
            name: "bad name".to_string(),
            operation: Operation::Create,
            fault: BackendFault::new("Client.InvalidParameter.KeyName", "malformed"),
        };
        let display = format!("{}", err);
        assert!(display.contains("'bad name'"));
        assert!(display.contains("create"));
        assert!(display.contains("Client.InvalidParameter.KeyName"));
        assert_eq!(err.kind(), ErrorKind::InvalidName);
    }

    #[test]
    fn test_transport_has_no_fault() {
        let err = KeywardError::Transport {
            name: "k1".to_string(),
            operation: Operation::Describe,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert!(err.fault().is_none());
        assert!(format!("{}", err).contains("connection reset"));
    }

    #[test]
    fn test_unknown_client_keeps_raw_payload() {
        let err = KeywardError::UnknownClient {
            name: "k1".to_string(),
            operation: Operation::Delete,
            fault: unknown_fault(),
        };
        assert_eq!(err.kind(), ErrorKind::UnknownClientError);
        assert_eq!(err.fault(), Some(&unknown_fault()));
    }

    #[test]
    fn test_partial_replace_delegates_to_source() {
        let err = KeywardError::PartialReplace {
            name: "k1".to_string(),
            source: Box::new(KeywardError::InvalidCredentialMaterial {
                name: "k1".to_string(),
                operation: Operation::Import,
                fault: BackendFault::new("Client.InvalidParameter.PublicKeyMaterial", "bad"),
            }),
            warnings: Vec::new(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidCredentialMaterial);
        assert!(err.warnings().is_empty());
        assert_eq!(
            err.fault().map(|f| f.code.as_str()),
            Some("Client.InvalidParameter.PublicKeyMaterial")
        );
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("was deleted but re-import failed"));
    }

    #[test]
    fn test_material_error_is_invalid_request() {
        let err: KeywardError = keyward_ssh::SshError::MaterialNotText.into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_resource_leak_warning() {
        let err = KeywardError::UnknownClient {
            name: "keywardabc".to_string(),
            operation: Operation::Delete,
            fault: unknown_fault(),
        };
        let warning = Warning::resource_leak("keywardabc", &err);
        assert_eq!(warning.kind, ErrorKind::ResourceLeak);
        assert_eq!(warning.resource, "keywardabc");
        assert!(warning.detail.contains("could not be deleted"));
        assert_eq!(warning.fault, Some(unknown_fault()));
    }

    #[test]
    fn test_with_warnings_wraps_and_delegates() {
        let delete_failed = KeywardError::UnknownClient {
            name: "keywardabc".to_string(),
            operation: Operation::Delete,
            fault: unknown_fault(),
        };
        let leak = Warning::resource_leak("keywardabc", &delete_failed);

        let err = KeywardError::Transport {
            name: "k1".to_string(),
            operation: Operation::Delete,
            message: "reset".to_string(),
        }
        .with_warnings(vec![leak.clone()]);

        assert!(matches!(err, KeywardError::WithWarnings { .. }));
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert_eq!(err.warnings(), &[leak.clone()]);
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("1 warning(s)"));

        let partial = KeywardError::PartialReplace {
            name: "k1".to_string(),
            source: Box::new(KeywardError::Config("x".to_string())),
            warnings: Vec::new(),
        }
        .with_warnings(vec![leak.clone()]);
        assert!(matches!(partial, KeywardError::PartialReplace { .. }));
        assert_eq!(partial.warnings(), &[leak]);
    }

    #[test]
    fn test_with_no_warnings_is_unchanged() {
        let err = KeywardError::Config("x".to_string()).with_warnings(Vec::new());
        assert!(matches!(err, KeywardError::Config(_)));
        assert!(err.warnings().is_empty());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidCredentialMaterial).unwrap();
        assert_eq!(json, "\"invalid_credential_material\"");
        assert_eq!(ErrorKind::ResourceLeak.to_string(), "resource_leak");
    }
}
