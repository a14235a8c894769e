// ABOUTME: Data model for key pair reconciliation.
// ABOUTME: KeyRecord observations, DesiredState requests, and ReconcileOutcome results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Warning;

/// A remote key pair as observed by a describe or produced by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Unique name within the account/region scope.
    pub name: String,
    /// Fingerprint of the public key as computed by the remote side.
    pub fingerprint: String,
    /// Base64 private key, only returned by password-based creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KeyRecord {
    pub fn new(name: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fingerprint: fingerprint.into(),
            private_key: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// Description with an unset value read as empty.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// The state a caller wants a named key pair to be in.
#[derive(Clone, PartialEq, Eq)]
pub enum DesiredState {
    /// No key pair with this name should exist.
    Absent { name: String },
    /// A key pair generated by the remote side, protected by `password`.
    PresentGenerated {
        name: String,
        password: String,
        description: String,
    },
    /// A key pair built from caller-supplied base64 public key material.
    PresentImported {
        name: String,
        public_key_material: String,
        description: String,
        /// Replace an existing key pair whose fingerprint differs.
        overwrite_on_change: bool,
    },
}

impl DesiredState {
    pub fn name(&self) -> &str {
        match self {
            DesiredState::Absent { name }
            | DesiredState::PresentGenerated { name, .. }
            | DesiredState::PresentImported { name, .. } => name,
        }
    }
}

// Passwords must not reach logs through `{:?}`.
impl fmt::Debug for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Absent { name } => f.debug_struct("Absent").field("name", name).finish(),
            DesiredState::PresentGenerated {
                name, description, ..
            } => f
                .debug_struct("PresentGenerated")
                .field("name", name)
                .field("password", &"<redacted>")
                .field("description", description)
                .finish(),
            DesiredState::PresentImported {
                name,
                public_key_material,
                description,
                overwrite_on_change,
            } => f
                .debug_struct("PresentImported")
                .field("name", name)
                .field("public_key_material", public_key_material)
                .field("description", description)
                .field("overwrite_on_change", overwrite_on_change)
                .finish(),
        }
    }
}

/// What a reconciliation did, or would have done in check mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    AlreadyExists,
    Deleted,
    DidNotExist,
    Replaced,
    DescriptionUpdated,
}

impl Action {
    /// Human-readable summary used as the outcome message.
    pub fn message(&self) -> &'static str {
        match self {
            Action::Created => "key pair created",
            Action::AlreadyExists => "key pair already exists",
            Action::Deleted => "key pair deleted",
            Action::DidNotExist => "key did not exist",
            Action::Replaced => "key pair updated",
            Action::DescriptionUpdated => "key pair description updated",
        }
    }
}

/// Result of a reconciliation, the sole contract returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub changed: bool,
    pub action: Action,
    /// The resulting key pair; absent after a delete and for creations in check mode.
    pub record: Option<KeyRecord>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl ReconcileOutcome {
    pub fn changed(action: Action, record: Option<KeyRecord>) -> Self {
        Self::build(true, action, record)
    }

    pub fn unchanged(action: Action, record: Option<KeyRecord>) -> Self {
        Self::build(false, action, record)
    }

    fn build(changed: bool, action: Action, record: Option<KeyRecord>) -> Self {
        Self {
            changed,
            action,
            record,
            message: action.message().to_string(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = Warning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Append a note to the message without changing the action.
    pub fn with_note(mut self, note: &str) -> Self {
        self.message = format!("{} ({})", self.message, note);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
