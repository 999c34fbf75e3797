//! SHA-256 content digests

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Compute SHA-256 of bytes and return hex string
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 of a file's contents without loading it whole
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Whether a sidecar checksum vouches for `computed`.
///
/// The sidecar text must start with the computed digest, so `sha256sum`
/// output (`<hex>  <file>`) is accepted as written.
pub fn matches_sidecar(expected: &str, computed: &str) -> bool {
    !computed.is_empty() && expected.starts_with(computed)
}
