// ABOUTME: Reconciliation of remote SSH key pairs to a declared present/absent state.
// ABOUTME: Exposes the engine, the store seam and adapter, the fingerprint probe, and config.

//! # keyward-core
//!
//! Brings a named key pair on a remote compute platform to a desired state
//! with the fewest mutating calls, in the manner of an infrastructure-as-code
//! "ensure" operation.
//!
//! ```ignore
//! use keyward_core::{ApiKeyStore, DesiredState, Reconciler, Settings};
//!
//! let settings = Settings::load(path)?.resolve()?;
//! let store = ApiKeyStore::new(my_api_client, &settings.client)?;
//! let reconciler = Reconciler::new(store, settings.engine)?;
//!
//! let outcome = reconciler
//!     .reconcile(&DesiredState::Absent { name: "oldkey".into() })
//!     .await?;
//! println!("{}", outcome.to_json()?);
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod params;
pub mod probe;
pub mod store;

pub use api::{ApiError, KeyPairApi, RawKeyPair};
pub use config::{ClientConfig, EngineConfig, ScratchConfig, Settings};
pub use engine::Reconciler;
pub use error::{BackendFault, ErrorKind, KeywardError, Operation, Result, Warning};
pub use memory::InMemoryKeyPairApi;
pub use model::{Action, DesiredState, KeyRecord, ReconcileOutcome};
pub use params::{KeyPairParams, State};
pub use probe::{FingerprintProbe, ProbeReport};
pub use store::{ApiKeyStore, RemoteKeyStore};
