// ABOUTME: Loose tool-facing parameters for a key pair, as an automation task would declare them.
// ABOUTME: Validates the combination and converts it into a DesiredState.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{KeywardError, Result};
use crate::model::DesiredState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

/// Parameters for one key pair.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPairParams {
    pub name: String,
    pub state: State,
    /// Generate the key pair server-side, protected by this password.
    pub password: Option<String>,
    /// Base64 public key material to import.
    pub key_material: Option<String>,
    /// OpenSSH `.pub` file to import.
    pub public_key_file: Option<PathBuf>,
    /// Replace an existing imported key pair whose fingerprint differs.
    pub force: bool,
    pub description: String,
}

impl std::fmt::Debug for KeyPairParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairParams")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_material", &self.key_material)
            .field("public_key_file", &self.public_key_file)
            .field("force", &self.force)
            .field("description", &self.description)
            .finish()
    }
}

impl KeyPairParams {
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: State::Absent,
            ..Default::default()
        }
    }

    /// Validate the parameter combination and build the desired state.
    ///
    /// A `public_key_file` is read and encoded here, so the returned state
    /// carries material only.
    pub fn into_desired(self) -> Result<DesiredState> {
        if self.name.is_empty() {
            return Err(KeywardError::InvalidRequest(
                "name must not be empty".to_string(),
            ));
        }

        let sources = [
            self.password.is_some(),
            self.key_material.is_some(),
            self.public_key_file.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if sources > 1 {
            return Err(KeywardError::InvalidRequest(
                "password, key_material and public_key_file are mutually exclusive".to_string(),
            ));
        }

        match self.state {
            State::Absent => Ok(DesiredState::Absent { name: self.name }),
            State::Present => {
                if let Some(password) = self.password {
                    return Ok(DesiredState::PresentGenerated {
                        name: self.name,
                        password,
                        description: self.description,
                    });
                }

                let public_key_material = match (self.key_material, self.public_key_file) {
                    (Some(material), _) => material,
                    (None, Some(path)) => keyward_ssh::material_from_file(&path)?,
                    (None, None) => {
                        return Err(KeywardError::InvalidRequest(format!(
                            "state=present for '{}' requires one of password, key_material or public_key_file",
                            self.name
                        )))
                    }
                };

                Ok(DesiredState::PresentImported {
                    name: self.name,
                    public_key_material,
                    description: self.description,
                    overwrite_on_change: self.force,
                })
            }
        }
    }
}

impl TryFrom<KeyPairParams> for DesiredState {
    type Error = KeywardError;

    fn try_from(params: KeyPairParams) -> Result<Self> {
        params.into_desired()
    }
}
