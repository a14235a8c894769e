// ABOUTME: Integration tests for keyward-ssh.
// ABOUTME: Exercises the file -> material -> fingerprint path used to build import requests.

use keyward_ssh::{
    compute_fingerprint, decode_material, fingerprint_material, load_public_key,
    material_from_file,
};
use tempfile::TempDir;

const ED25519_PUB: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIO3mepiIGcR/X0pUqTHo4qI27NLDq/DXpX/C2m+nGcM9 harper@disaster.localdomain";
const ED25519_MATERIAL: &str = "c3NoLWVkMjU1MTkgQUFBQUMzTnphQzFsWkRJMU5URTVBQUFBSU8zbWVwaUlHY1IvWDBwVXFUSG80cUkyN05MRHEvRFhwWC9DMm0rbkdjTTkgaGFycGVyQGRpc2FzdGVyLmxvY2FsZG9tYWlu";
const RSA_FP: &str = "fe:bf:2a:db:0f:fe:04:7e:a0:68:07:9d:5e:a8:f8:c3:99:ca:8f:f6:71:b7:ce:e4:4e:53:38:6a:54:d2:7a:3b";
const RSA_PUB: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQCke98OvTLtMlzL35GzBAGxMVPezJVlTOlKihyWllcDuYzh56p3GBqoMXZebOGdOp+OAt2QG+E6S82ON64AZYpP+/YSmZfXFzcNpEERvE+e+GYaA7rKIumIWg419yT4QfoxoLpDPPg1StbX+td9ax9jyLpr085eVFlaHPd9nTXVK/D0TAVpSC5pg+e+yvkuC8tXzOfviyTg8uMh6Pov+ByREhFDg8wW/tZtS6Gfna9dM+uyUAQp9Ahr43vQs6yMW623ATX8FK178Onr5ff5VanywWEdbaYojiGGJFhdVbENTTES36FEbbA1+O8OmFmOdSwveeEExi8K5jBnrZMao31T test@keyward";

#[test]
fn test_pub_file_produces_expected_material() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let key_path = temp_dir.path().join("id_ed25519.pub");
    std::fs::write(&key_path, format!("{}\n", ED25519_PUB)).expect("should write key");

    let material = material_from_file(&key_path).expect("should encode material");
    assert_eq!(material, ED25519_MATERIAL);
}

#[test]
fn test_rsa_fingerprint_matches_ssh_keygen() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let key_path = temp_dir.path().join("id_rsa.pub");
    std::fs::write(&key_path, RSA_PUB).expect("should write key");

    let key = load_public_key(&key_path).expect("should load");
    assert_eq!(compute_fingerprint(&key), RSA_FP);

    let material = material_from_file(&key_path).expect("should encode");
    assert_eq!(fingerprint_material(&material).expect("fingerprint"), RSA_FP);
}

#[test]
fn test_material_round_trips_through_decode() {
    let key = decode_material(ED25519_MATERIAL).expect("should decode");
    assert_eq!(key.comment(), "harper@disaster.localdomain");
    assert!(key.key_data().is_ed25519());
}
