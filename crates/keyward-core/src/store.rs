// ABOUTME: RemoteKeyStore seam used by the engine, plus the adapter over a raw KeyPairApi.
// ABOUTME: Maps backend error codes into the error taxonomy and normalizes not-found to None.

use async_trait::async_trait;

use crate::api::{ApiError, KeyPairApi, ATTRIBUTE_DESCRIPTION, NOT_FOUND_KEY_PAIR};
use crate::config::ClientConfig;
use crate::error::{BackendFault, ErrorKind, KeywardError, Operation, Result};
use crate::model::KeyRecord;

/// The capabilities the reconciliation engine needs from the remote side.
#[async_trait]
pub trait RemoteKeyStore: Send + Sync {
    /// Look up a key pair. A missing key pair is `Ok(None)`, never an error.
    async fn find(&self, name: &str) -> Result<Option<KeyRecord>>;

    /// Generate a key pair server-side. The returned record carries the private key.
    async fn create(&self, name: &str, password: &str, description: &str) -> Result<KeyRecord>;

    async fn import_material(
        &self,
        name: &str,
        public_key_material: &str,
        description: &str,
    ) -> Result<KeyRecord>;

    /// Delete a key pair. Deleting an already-absent key pair succeeds.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn set_description(&self, name: &str, description: &str) -> Result<KeyRecord>;
}

/// Classify a backend error code.
///
/// Codes follow `Client.<Category>.<Field>`: not-found categories map to
/// [`ErrorKind::NotFound`], parameter errors on the name or on key/password
/// fields map to the matching kinds, and everything else is unknown.
pub fn classify_code(code: &str) -> ErrorKind {
    let mut parts = code.split('.');
    let _origin = parts.next();
    let category = parts.next().unwrap_or("");
    let field = parts.last().unwrap_or("");

    if category.contains("NotFound") {
        return ErrorKind::NotFound;
    }

    let parameter_error = category.starts_with("InvalidParameter")
        && !category.contains("Duplicate")
        && !category.contains("InUse");
    if !parameter_error {
        return ErrorKind::UnknownClientError;
    }

    match field {
        "KeyName" => ErrorKind::InvalidName,
        "Password" | "PublicKeyMaterial" | "KeyMaterial" => ErrorKind::InvalidCredentialMaterial,
        _ => ErrorKind::UnknownClientError,
    }
}

/// A backend error after classification.
enum Mapped {
    NotFound(BackendFault),
    Fatal(KeywardError),
}

fn map_error(err: ApiError, operation: Operation, name: &str) -> Mapped {
    let name = name.to_string();
    match err {
        ApiError::Transport(message) => Mapped::Fatal(KeywardError::Transport {
            name,
            operation,
            message,
        }),
        ApiError::Service { code, message } => {
            let kind = classify_code(&code);
            let fault = BackendFault { code, message };
            match kind {
                ErrorKind::NotFound => Mapped::NotFound(fault),
                ErrorKind::InvalidName => Mapped::Fatal(KeywardError::InvalidName {
                    name,
                    operation,
                    fault,
                }),
                ErrorKind::InvalidCredentialMaterial => {
                    Mapped::Fatal(KeywardError::InvalidCredentialMaterial {
                        name,
                        operation,
                        fault,
                    })
                }
                _ => Mapped::Fatal(KeywardError::UnknownClient {
                    name,
                    operation,
                    fault,
                }),
            }
        }
    }
}

/// Map an error where not-found has no special meaning.
fn fatal(err: ApiError, operation: Operation, name: &str) -> KeywardError {
    match map_error(err, operation, name) {
        Mapped::Fatal(err) => err,
        Mapped::NotFound(fault) => KeywardError::UnknownClient {
            name: name.to_string(),
            operation,
            fault,
        },
    }
}

/// [`RemoteKeyStore`] over a raw service client.
pub struct ApiKeyStore<C> {
    client: C,
    /// Region the client was built for; only used to label log events.
    region: Option<String>,
}

impl<C: KeyPairApi> ApiKeyStore<C> {
    /// Wrap `client`, built by the caller from the same `config`.
    pub fn new(client: C, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            region: config.region.clone(),
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

#[async_trait]
impl<C: KeyPairApi> RemoteKeyStore for ApiKeyStore<C> {
    async fn find(&self, name: &str) -> Result<Option<KeyRecord>> {
        tracing::debug!(region = ?self.region, key_name = %name, "Describing key pair");

        match self.client.describe_key_pairs(&[name.to_string()]).await {
            Ok(pairs) => Ok(pairs
                .into_iter()
                .find(|pair| pair.key_name == name)
                .map(KeyRecord::from)),
            Err(err) => match map_error(err, Operation::Describe, name) {
                Mapped::NotFound(fault) => {
                    tracing::debug!(key_name = %name, code = %fault.code, "Key pair not found");
                    Ok(None)
                }
                Mapped::Fatal(err) => Err(err),
            },
        }
    }

    async fn create(&self, name: &str, password: &str, description: &str) -> Result<KeyRecord> {
        tracing::info!(region = ?self.region, key_name = %name, "Creating key pair");

        self.client
            .create_key_pair(name, password, description)
            .await
            .map(KeyRecord::from)
            .map_err(|err| fatal(err, Operation::Create, name))
    }

    async fn import_material(
        &self,
        name: &str,
        public_key_material: &str,
        description: &str,
    ) -> Result<KeyRecord> {
        tracing::info!(region = ?self.region, key_name = %name, "Importing key pair");

        self.client
            .import_key_pair(name, public_key_material, description)
            .await
            .map(KeyRecord::from)
            .map_err(|err| fatal(err, Operation::Import, name))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        tracing::info!(region = ?self.region, key_name = %name, "Deleting key pair");

        match self.client.delete_key_pair(name).await {
            Ok(()) => Ok(()),
            Err(err) => match map_error(err, Operation::Delete, name) {
                Mapped::NotFound(_) => {
                    tracing::debug!(key_name = %name, "Key pair already absent");
                    Ok(())
                }
                Mapped::Fatal(err) => Err(err),
            },
        }
    }

    async fn set_description(&self, name: &str, description: &str) -> Result<KeyRecord> {
        tracing::info!(region = ?self.region, key_name = %name, "Updating key pair description");

        self.client
            .modify_key_pair_attribute(name, ATTRIBUTE_DESCRIPTION, description)
            .await
            .map_err(|err| fatal(err, Operation::ModifyAttribute, name))?;

        self.find(name)
            .await?
            .ok_or_else(|| KeywardError::UnknownClient {
                name: name.to_string(),
                operation: Operation::Describe,
                fault: BackendFault::new(
                    NOT_FOUND_KEY_PAIR,
                    "key pair disappeared after its description was updated",
                ),
            })
    }
}
