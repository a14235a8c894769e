// ABOUTME: In-process KeyPairApi that behaves like the remote key pair service.
// ABOUTME: Generates and fingerprints real keys, records calls, and injects one-shot faults.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::api::{ApiError, KeyPairApi, RawKeyPair, ATTRIBUTE_DESCRIPTION, NOT_FOUND_KEY_PAIR};
use crate::config::MAX_KEY_NAME_LEN;
use crate::error::Operation;
use crate::model::KeyRecord;

pub const INVALID_KEY_NAME: &str = "Client.InvalidParameter.KeyName";
pub const DUPLICATE_KEY_NAME: &str = "Client.InvalidParameterDuplicate.KeyName";
pub const INVALID_PASSWORD: &str = "Client.InvalidParameter.Password";
pub const INVALID_PUBLIC_KEY_MATERIAL: &str = "Client.InvalidParameter.PublicKeyMaterial";
pub const INVALID_ATTRIBUTE: &str = "Client.InvalidParameter.Attribute";

/// A call received by [`InMemoryKeyPairApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Describe(Vec<String>),
    Create(String),
    Import(String),
    Delete(String),
    ModifyAttribute {
        name: String,
        attribute: String,
        value: String,
    },
}

impl ApiCall {
    pub fn operation(&self) -> Operation {
        match self {
            ApiCall::Describe(_) => Operation::Describe,
            ApiCall::Create(_) => Operation::Create,
            ApiCall::Import(_) => Operation::Import,
            ApiCall::Delete(_) => Operation::Delete,
            ApiCall::ModifyAttribute { .. } => Operation::ModifyAttribute,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, ApiCall::Describe(_))
    }

    /// Whether the call addresses key pair `name`.
    pub fn targets(&self, name: &str) -> bool {
        match self {
            ApiCall::Describe(names) => names.iter().any(|n| n == name),
            ApiCall::Create(n) | ApiCall::Import(n) | ApiCall::Delete(n) => n == name,
            ApiCall::ModifyAttribute { name: n, .. } => n == name,
        }
    }
}

struct Fault {
    operation: Operation,
    name: Option<String>,
    error: ApiError,
}

impl Fault {
    fn matches(&self, call: &ApiCall) -> bool {
        self.operation == call.operation()
            && self.name.as_deref().map_or(true, |name| call.targets(name))
    }
}

#[derive(Default)]
struct MemoryState {
    keys: BTreeMap<String, RawKeyPair>,
    calls: Vec<ApiCall>,
    faults: Vec<Fault>,
}

/// Key pair service kept in memory.
///
/// Fingerprints are real SHA256 fingerprints of the stored public keys, so
/// the same material always yields the same fingerprint.
#[derive(Default)]
pub struct InMemoryKeyPairApi {
    state: Mutex<MemoryState>,
    empty_describe_for_missing: bool,
}

impl InMemoryKeyPairApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a describe of unknown names with an empty list instead of a
    /// not-found error.
    pub fn with_empty_describe_for_missing(mut self) -> Self {
        self.empty_describe_for_missing = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a key pair directly, bypassing validation and the call log.
    pub fn seed(&self, record: KeyRecord) {
        let raw = RawKeyPair {
            key_name: record.name.clone(),
            key_fingerprint: record.fingerprint,
            key_material: None,
            description: record.description,
        };
        self.state().keys.insert(record.name, raw);
    }

    pub fn get(&self, name: &str) -> Option<RawKeyPair> {
        self.state().keys.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.state().keys.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn mutations(&self) -> Vec<ApiCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: ApiError) {
        self.state().faults.push(Fault {
            operation,
            name: None,
            error,
        });
    }

    /// Make the next call of `operation` addressing `name` fail with `error`.
    pub fn fail_next_for(&self, operation: Operation, name: &str, error: ApiError) {
        self.state().faults.push(Fault {
            operation,
            name: Some(name.to_string()),
            error,
        });
    }

    /// Log the call and return its injected fault, if any.
    fn begin(&self, call: ApiCall) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let mut state = self.state();
        let armed = state.faults.iter().position(|fault| fault.matches(&call));
        let operation = call.operation();
        state.calls.push(call);
        match armed {
            Some(index) => {
                let err = state.faults.remove(index).error;
                tracing::debug!(operation = %operation, error = %err, "Injected fault");
                Err(err)
            }
            None => Ok(state),
        }
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_KEY_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ApiError::service(
            INVALID_KEY_NAME,
            format!("key name '{}' must be 1-{} alphanumerics", name, MAX_KEY_NAME_LEN),
        ))
    }
}

fn not_found(name: &str) -> ApiError {
    ApiError::service(
        NOT_FOUND_KEY_PAIR,
        format!("the key pair '{}' does not exist", name),
    )
}

#[async_trait]
impl KeyPairApi for InMemoryKeyPairApi {
    async fn describe_key_pairs(&self, names: &[String]) -> Result<Vec<RawKeyPair>, ApiError> {
        let state = self.begin(ApiCall::Describe(names.to_vec()))?;

        if names.is_empty() {
            return Ok(state.keys.values().cloned().collect());
        }

        let mut pairs = Vec::with_capacity(names.len());
        for name in names {
            match state.keys.get(name) {
                Some(pair) => pairs.push(pair.clone()),
                None if self.empty_describe_for_missing => {}
                None => return Err(not_found(name)),
            }
        }
        Ok(pairs)
    }

    async fn create_key_pair(
        &self,
        name: &str,
        password: &str,
        description: &str,
    ) -> Result<RawKeyPair, ApiError> {
        let mut state = self.begin(ApiCall::Create(name.to_string()))?;
        validate_name(name)?;
        if state.keys.contains_key(name) {
            return Err(ApiError::service(DUPLICATE_KEY_NAME, "key name already in use"));
        }

        let generated = keyward_ssh::generate_key_pair(password)
            .map_err(|e| ApiError::service(INVALID_PASSWORD, e.to_string()))?;

        let pair = RawKeyPair {
            key_name: name.to_string(),
            key_fingerprint: keyward_ssh::compute_fingerprint(&generated.public_key),
            key_material: None,
            description: Some(description.to_string()),
        };
        state.keys.insert(name.to_string(), pair.clone());

        Ok(RawKeyPair {
            key_material: Some(generated.private_key_material),
            ..pair
        })
    }

    async fn import_key_pair(
        &self,
        name: &str,
        public_key_material: &str,
        description: &str,
    ) -> Result<RawKeyPair, ApiError> {
        let mut state = self.begin(ApiCall::Import(name.to_string()))?;
        validate_name(name)?;
        if state.keys.contains_key(name) {
            return Err(ApiError::service(DUPLICATE_KEY_NAME, "key name already in use"));
        }

        let fingerprint = keyward_ssh::fingerprint_material(public_key_material)
            .map_err(|e| ApiError::service(INVALID_PUBLIC_KEY_MATERIAL, e.to_string()))?;

        let pair = RawKeyPair {
            key_name: name.to_string(),
            key_fingerprint: fingerprint,
            key_material: None,
            description: Some(description.to_string()),
        };
        state.keys.insert(name.to_string(), pair.clone());
        Ok(pair)
    }

    async fn delete_key_pair(&self, name: &str) -> Result<(), ApiError> {
        let mut state = self.begin(ApiCall::Delete(name.to_string()))?;
        match state.keys.remove(name) {
            Some(_) => Ok(()),
            None => Err(not_found(name)),
        }
    }

    async fn modify_key_pair_attribute(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.begin(ApiCall::ModifyAttribute {
            name: name.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        })?;
        if attribute != ATTRIBUTE_DESCRIPTION {
            return Err(ApiError::service(
                INVALID_ATTRIBUTE,
                format!("unsupported attribute '{}'", attribute),
            ));
        }
        let pair = state.keys.get_mut(name).ok_or_else(|| not_found(name))?;
        pair.description = Some(value.to_string());
        Ok(())
    }
}
