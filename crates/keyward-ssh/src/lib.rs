// ABOUTME: Public key material utilities for keyward.
// ABOUTME: Encodes OpenSSH keys as base64 material, fingerprints them, and generates key pairs.

mod error;
mod fingerprint;
mod material;

pub use error::{Result, SshError};
pub use fingerprint::{compute_fingerprint, fingerprint_material};
pub use material::{
    decode_material, encode_material, generate_key_pair, load_public_key, material_from_file,
    GeneratedKeyPair,
};

// Re-export the key type so callers don't need a direct ssh-key dependency.
pub use ssh_key::PublicKey;
