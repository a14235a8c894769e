// ABOUTME: SSH public key fingerprint computation.
// ABOUTME: Produces colon-separated SHA256 fingerprints over the key's wire encoding.

use crate::error::Result;
use crate::material::decode_material;
use ssh_key::{HashAlg, PublicKey};

/// Compute the SHA256 fingerprint of a public key as colon-separated lowercase hex.
///
/// The hash covers the SSH wire encoding of the key data only, so the key
/// comment does not influence the result. Any algorithm ssh-key can parse is
/// accepted.
///
/// # Returns
/// 32 hex byte pairs joined by `:` (95 characters).
pub fn compute_fingerprint(public_key: &PublicKey) -> String {
    let fingerprint = public_key.fingerprint(HashAlg::Sha256);

    fingerprint
        .as_bytes()
        .iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Decode base64 key material and fingerprint the public key it carries.
///
/// # Errors
/// Returns an error if the material is not base64 or not an OpenSSH public key.
pub fn fingerprint_material(material: &str) -> Result<String> {
    let public_key = decode_material(material)?;
    Ok(compute_fingerprint(&public_key))
}
