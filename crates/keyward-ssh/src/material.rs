// ABOUTME: Conversion between OpenSSH public keys and base64 key material.
// ABOUTME: Also generates password-protected ed25519 key pairs for server-side creation.

use crate::error::{Result, SshError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ssh_key::{Algorithm, LineEnding, PrivateKey, PublicKey};
use std::path::Path;

/// Load an OpenSSH public key (`.pub` file contents) from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_public_key(key_path: &Path) -> Result<PublicKey> {
    let key_data = std::fs::read_to_string(key_path).map_err(|e| SshError::ReadKey {
        path: key_path.to_path_buf(),
        source: e,
    })?;

    PublicKey::from_openssh(key_data.trim()).map_err(SshError::ParseKey)
}

/// Encode a public key as base64 of its OpenSSH line, the form the remote store imports.
///
/// # Errors
/// Returns an error if the key cannot be serialized.
pub fn encode_material(public_key: &PublicKey) -> Result<String> {
    let line = public_key.to_openssh().map_err(SshError::SerializeKey)?;
    Ok(STANDARD.encode(line.as_bytes()))
}

/// Read a `.pub` file and return its base64 key material.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or serialized.
pub fn material_from_file(key_path: &Path) -> Result<String> {
    encode_material(&load_public_key(key_path)?)
}

/// Decode base64 key material back into a public key.
///
/// # Errors
/// Returns an error if the material is not base64, not text, or not an OpenSSH key.
pub fn decode_material(material: &str) -> Result<PublicKey> {
    let bytes = STANDARD
        .decode(material.trim())
        .map_err(SshError::DecodeMaterial)?;
    let line = String::from_utf8(bytes).map_err(|_| SshError::MaterialNotText)?;

    PublicKey::from_openssh(line.trim()).map_err(SshError::ParseKey)
}

/// A freshly generated key pair whose private half is encrypted with a password.
#[derive(Debug, Clone)]
pub struct GeneratedKeyPair {
    /// Public half, used for fingerprinting.
    pub public_key: PublicKey,
    /// Base64 of the encrypted OpenSSH private key.
    pub private_key_material: String,
}

/// Generate a new ed25519 key pair and encrypt the private key with `password`.
///
/// # Errors
/// Returns an error if the password is empty or generation/encryption fails.
pub fn generate_key_pair(password: &str) -> Result<GeneratedKeyPair> {
    if password.is_empty() {
        return Err(SshError::EmptyPassword);
    }

    let mut rng = rand::thread_rng();
    let private_key =
        PrivateKey::random(&mut rng, Algorithm::Ed25519).map_err(SshError::GenerateKey)?;
    let encrypted = private_key
        .encrypt(&mut rng, password)
        .map_err(SshError::GenerateKey)?;
    let pem = encrypted
        .to_openssh(LineEnding::LF)
        .map_err(SshError::SerializeKey)?;

    Ok(GeneratedKeyPair {
        public_key: private_key.public_key().clone(),
        private_key_material: STANDARD.encode(pem.as_bytes()),
    })
}
