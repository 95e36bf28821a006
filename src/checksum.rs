use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn generate_checksum(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
