// ABOUTME: Learns the fingerprint the remote side assigns to public key material.
// ABOUTME: Imports the material under a free scratch name, records the fingerprint, then deletes it.

use uuid::Uuid;

use crate::config::{ScratchConfig, MAX_KEY_NAME_LEN};
use crate::error::{KeywardError, Result, Warning};
use crate::store::RemoteKeyStore;

/// Build a candidate scratch name: the prefix followed by random lowercase hex,
/// capped at the remote name length limit.
pub fn scratch_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let take = MAX_KEY_NAME_LEN.saturating_sub(prefix.len()).min(suffix.len());
    format!("{}{}", prefix, &suffix[..take])
}

/// Fingerprint learned by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub fingerprint: String,
    /// Set when the scratch key pair could not be deleted afterwards.
    pub leak: Option<Warning>,
}

/// Round-trips key material through a disposable key pair.
pub struct FingerprintProbe<'a, S: ?Sized> {
    store: &'a S,
    config: &'a ScratchConfig,
}

impl<'a, S: RemoteKeyStore + ?Sized> FingerprintProbe<'a, S> {
    pub fn new(store: &'a S, config: &'a ScratchConfig) -> Self {
        Self { store, config }
    }

    /// Compute the fingerprint the remote side would assign to `public_key_material`.
    ///
    /// # Errors
    /// Fails if no free scratch name is found or the scratch import fails.
    /// A failed scratch delete is not an error; it is reported in
    /// [`ProbeReport::leak`].
    pub async fn probe(&self, public_key_material: &str) -> Result<ProbeReport> {
        let scratch = self.reserve_name().await?;

        let record = self
            .store
            .import_material(&scratch, public_key_material, "")
            .await?;
        tracing::debug!(
            scratch = %scratch,
            fingerprint = %record.fingerprint,
            "Probed key material fingerprint"
        );

        let leak = match self.store.delete(&scratch).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    scratch = %scratch,
                    error = %err,
                    "Failed to delete scratch key pair; it must be removed manually"
                );
                Some(Warning::resource_leak(&scratch, &err))
            }
        };

        Ok(ProbeReport {
            fingerprint: record.fingerprint,
            leak,
        })
    }

    /// Generate scratch names until one is not in use.
    async fn reserve_name(&self) -> Result<String> {
        for attempt in 1..=self.config.max_attempts {
            let candidate = scratch_name(&self.config.prefix);
            if self.store.find(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::info!(
                attempt,
                candidate = %candidate,
                "Scratch name in use, generating another"
            );
        }

        Err(KeywardError::ScratchNamesExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendFault, ErrorKind, Operation};
    use crate::model::KeyRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Store whose `find` reports the first `occupied` lookups as taken.
    #[derive(Default)]
    struct ProbeStore {
        occupied: usize,
        fail_import: bool,
        fail_delete: bool,
        finds: Mutex<Vec<String>>,
        imports: Mutex<Vec<(String, String)>>,
        deletes: Mutex<Vec<String>>,
    }

    fn fault() -> BackendFault {
        BackendFault::new("Server.InternalError", "boom")
    }

    #[async_trait]
    impl RemoteKeyStore for ProbeStore {
        async fn find(&self, name: &str) -> Result<Option<KeyRecord>> {
            let mut finds = self.finds.lock().unwrap();
            finds.push(name.to_string());
            if finds.len() <= self.occupied {
                Ok(Some(KeyRecord::new(name, "taken")))
            } else {
                Ok(None)
            }
        }

        async fn create(
            &self,
            _name: &str,
            _password: &str,
            _description: &str,
        ) -> Result<KeyRecord> {
            panic!("probe must not create key pairs");
        }

        async fn import_material(
            &self,
            name: &str,
            public_key_material: &str,
            description: &str,
        ) -> Result<KeyRecord> {
            assert_eq!(description, "", "scratch imports carry no description");
            self.imports
                .lock()
                .unwrap()
                .push((name.to_string(), public_key_material.to_string()));
            if self.fail_import {
                return Err(KeywardError::InvalidCredentialMaterial {
                    name: name.to_string(),
                    operation: Operation::Import,
                    fault: BackendFault::new("Client.InvalidParameter.PublicKeyMaterial", "bad"),
                });
            }
            Ok(KeyRecord::new(name, format!("fp-of-{}", public_key_material)))
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.deletes.lock().unwrap().push(name.to_string());
            if self.fail_delete {
                return Err(KeywardError::UnknownClient {
                    name: name.to_string(),
                    operation: Operation::Delete,
                    fault: fault(),
                });
            }
            Ok(())
        }

        async fn set_description(&self, _name: &str, _description: &str) -> Result<KeyRecord> {
            panic!("probe must not modify key pairs");
        }
    }

    #[test]
    fn test_scratch_name_shape() {
        let name = scratch_name("keyward");
        assert_eq!(name.len(), MAX_KEY_NAME_LEN);
        assert!(name.starts_with("keyward"));
        assert!(name["keyward".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(scratch_name("keyward"), scratch_name("keyward"));
    }

    #[test]
    fn test_scratch_name_short_prefix_uses_whole_uuid() {
        assert_eq!(scratch_name("k").len(), MAX_KEY_NAME_LEN);
        assert_eq!(scratch_name("").len(), MAX_KEY_NAME_LEN);
    }

    #[tokio::test]
    async fn test_probe_imports_then_deletes_scratch() {
        let store = ProbeStore::default();
        let config = ScratchConfig::default();

        let report = FingerprintProbe::new(&store, &config)
            .probe("TUFURVJJQUw=")
            .await
            .unwrap();

        assert_eq!(report.fingerprint, "fp-of-TUFURVJJQUw=");
        assert!(report.leak.is_none());

        let finds = store.finds.lock().unwrap();
        let imports = store.imports.lock().unwrap();
        let deletes = store.deletes.lock().unwrap();
        assert_eq!(finds.len(), 1);
        assert_eq!(imports[0].0, finds[0]);
        assert_eq!(deletes.as_slice(), &[finds[0].clone()]);
    }

    #[tokio::test]
    async fn test_probe_skips_occupied_name() {
        let store = ProbeStore {
            occupied: 1,
            ..Default::default()
        };
        let config = ScratchConfig::default();

        FingerprintProbe::new(&store, &config)
            .probe("TQ==")
            .await
            .unwrap();

        let finds = store.finds.lock().unwrap();
        let imports = store.imports.lock().unwrap();
        assert_eq!(finds.len(), 2);
        assert_ne!(imports[0].0, finds[0], "occupied name must not be used");
        assert_eq!(imports[0].0, finds[1]);
        assert_eq!(store.deletes.lock().unwrap().as_slice(), &[finds[1].clone()]);
    }

    #[tokio::test]
    async fn test_probe_gives_up_after_max_attempts() {
        let store = ProbeStore {
            occupied: usize::MAX,
            ..Default::default()
        };
        let config = ScratchConfig {
            max_attempts: 3,
            ..Default::default()
        };

        let err = FingerprintProbe::new(&store, &config)
            .probe("TQ==")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ScratchNamesExhausted);
        assert_eq!(store.finds.lock().unwrap().len(), 3);
        assert!(store.imports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_import_failure_aborts() {
        let store = ProbeStore {
            fail_import: true,
            ..Default::default()
        };
        let config = ScratchConfig::default();

        let err = FingerprintProbe::new(&store, &config)
            .probe("bad")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidCredentialMaterial);
        assert!(store.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_delete_failure_reports_leak() {
        let store = ProbeStore {
            fail_delete: true,
            ..Default::default()
        };
        let config = ScratchConfig::default();

        let report = FingerprintProbe::new(&store, &config)
            .probe("TQ==")
            .await
            .unwrap();

        assert_eq!(report.fingerprint, "fp-of-TQ==");
        let leak = report.leak.expect("leak should be reported");
        assert_eq!(leak.kind, ErrorKind::ResourceLeak);
        assert_eq!(leak.resource, store.imports.lock().unwrap()[0].0);
        assert_eq!(leak.fault, Some(fault()));
    }
}
