// ABOUTME: Reconciliation engine mapping a desired state and the live key pair to one action.
// ABOUTME: Handles create, import, delete, replace, and description updates, with check mode.

use crate::config::EngineConfig;
use crate::error::{KeywardError, Result, Warning};
use crate::model::{Action, DesiredState, KeyRecord, ReconcileOutcome};
use crate::probe::FingerprintProbe;
use crate::store::RemoteKeyStore;

const CHECK_MODE_PROBE_NOTE: &str = "fingerprint not probed in check mode";

/// Brings remote key pairs to a desired state through a [`RemoteKeyStore`].
///
/// Every call re-reads the current state; nothing is cached between calls.
pub struct Reconciler<S> {
    store: S,
    config: EngineConfig,
}

impl<S: RemoteKeyStore> Reconciler<S> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.scratch.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply the minimal change that makes the remote key pair match `desired`.
    ///
    /// In check mode no mutating call is issued; the outcome reports what
    /// would have changed. Comparing fingerprints needs a scratch import, so
    /// an imported key pair with `overwrite_on_change` that already exists is
    /// always reported as [`Action::Replaced`] with `changed = true` in check
    /// mode, even when the material would turn out to match.
    ///
    /// # Errors
    /// Any backend failure stops the reconciliation immediately. Work already
    /// committed remotely is not rolled back. A scratch key pair leaked before
    /// the failure is reported through [`KeywardError::warnings`].
    pub async fn reconcile(&self, desired: &DesiredState) -> Result<ReconcileOutcome> {
        let name = desired.name();
        tracing::debug!(
            key_name = %name,
            check_mode = self.config.check_mode,
            "Reconciling key pair"
        );

        let current = self.store.find(name).await?;

        let outcome = match desired {
            DesiredState::Absent { name } => self.ensure_absent(name, current).await?,
            DesiredState::PresentGenerated {
                name,
                password,
                description,
            } => {
                self.ensure_generated(name, password, description, current)
                    .await?
            }
            DesiredState::PresentImported {
                name,
                public_key_material,
                description,
                overwrite_on_change,
            } => {
                self.ensure_imported(
                    name,
                    public_key_material,
                    description,
                    *overwrite_on_change,
                    current,
                )
                .await?
            }
        };

        tracing::info!(
            key_name = %name,
            changed = outcome.changed,
            action = ?outcome.action,
            check_mode = self.config.check_mode,
            "Reconciled key pair"
        );
        Ok(outcome)
    }

    async fn ensure_absent(
        &self,
        name: &str,
        current: Option<KeyRecord>,
    ) -> Result<ReconcileOutcome> {
        let Some(record) = current else {
            return Ok(ReconcileOutcome::unchanged(Action::DidNotExist, None));
        };

        if self.config.check_mode {
            return Ok(ReconcileOutcome::changed(Action::Deleted, Some(record)));
        }

        self.store.delete(name).await?;
        Ok(ReconcileOutcome::changed(Action::Deleted, None))
    }

    async fn ensure_generated(
        &self,
        name: &str,
        password: &str,
        description: &str,
        current: Option<KeyRecord>,
    ) -> Result<ReconcileOutcome> {
        match current {
            None if self.config.check_mode => {
                Ok(ReconcileOutcome::changed(Action::Created, None))
            }
            None => {
                let record = self.store.create(name, password, description).await?;
                Ok(ReconcileOutcome::changed(Action::Created, Some(record)))
            }
            Some(record) if record.description_or_empty() != description => {
                if self.config.check_mode {
                    return Ok(ReconcileOutcome::changed(
                        Action::DescriptionUpdated,
                        Some(record),
                    ));
                }
                let updated = self.store.set_description(name, description).await?;
                Ok(ReconcileOutcome::changed(
                    Action::DescriptionUpdated,
                    Some(updated),
                ))
            }
            Some(record) => Ok(ReconcileOutcome::unchanged(
                Action::AlreadyExists,
                Some(record),
            )),
        }
    }

    async fn ensure_imported(
        &self,
        name: &str,
        material: &str,
        description: &str,
        overwrite_on_change: bool,
        current: Option<KeyRecord>,
    ) -> Result<ReconcileOutcome> {
        let Some(record) = current else {
            if self.config.check_mode {
                return Ok(ReconcileOutcome::changed(Action::Created, None));
            }
            let record = self.store.import_material(name, material, description).await?;
            return Ok(ReconcileOutcome::changed(Action::Created, Some(record)));
        };

        if !overwrite_on_change {
            return Ok(ReconcileOutcome::unchanged(
                Action::AlreadyExists,
                Some(record),
            ));
        }

        // Probing imports a scratch key pair, which check mode forbids.
        if self.config.check_mode {
            return Ok(
                ReconcileOutcome::changed(Action::Replaced, None).with_note(CHECK_MODE_PROBE_NOTE)
            );
        }

        let report = FingerprintProbe::new(&self.store, &self.config.scratch)
            .probe(material)
            .await?;
        let warnings: Vec<Warning> = report.leak.into_iter().collect();

        if report.fingerprint == record.fingerprint {
            tracing::debug!(key_name = %name, "Fingerprint unchanged, keeping key pair");
            return Ok(
                ReconcileOutcome::unchanged(Action::AlreadyExists, Some(record))
                    .with_warnings(warnings),
            );
        }

        tracing::info!(
            key_name = %name,
            current = %record.fingerprint,
            desired = %report.fingerprint,
            "Fingerprint changed, replacing key pair"
        );
        if let Err(err) = self.store.delete(name).await {
            return Err(err.with_warnings(warnings));
        }
        let replaced = self
            .store
            .import_material(name, material, description)
            .await
            .map_err(|err| {
                tracing::error!(
                    key_name = %name,
                    error = %err,
                    "Key pair deleted but re-import failed; it is now absent"
                );
                KeywardError::PartialReplace {
                    name: name.to_string(),
                    source: Box::new(err),
                    warnings: warnings.clone(),
                }
            })?;

        Ok(ReconcileOutcome::changed(Action::Replaced, Some(replaced)).with_warnings(warnings))
    }
}
