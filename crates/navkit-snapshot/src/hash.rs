/// `{prefix}_{blake3_hex}` content-addressed identifier, the same scheme
/// used throughout this workspace's persistence layers.
pub fn hash_bytes(prefix: &str, bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes);
    format!("{prefix}_{}", digest.to_hex())
}
