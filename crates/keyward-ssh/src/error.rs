// ABOUTME: Error types for SSH key material operations using thiserror.
// ABOUTME: Provides typed errors for reading, decoding, parsing, and generating keys.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while handling public key material.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to read a key file from disk.
    #[error("failed to read SSH public key from {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse an OpenSSH public key.
    #[error("failed to parse SSH public key: {0}")]
    ParseKey(#[source] ssh_key::Error),

    /// Material was not valid base64.
    #[error("key material is not valid base64: {0}")]
    DecodeMaterial(#[source] base64::DecodeError),

    /// Decoded material was not UTF-8 text.
    #[error("key material does not decode to text")]
    MaterialNotText,

    /// Failed to generate or encrypt a key pair.
    #[error("failed to generate SSH key pair: {0}")]
    GenerateKey(#[source] ssh_key::Error),

    /// Failed to serialize a key.
    #[error("failed to serialize key: {0}")]
    SerializeKey(#[source] ssh_key::Error),

    /// A password is required to protect generated keys.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
