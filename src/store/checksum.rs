//! CRC32 checksums for store records
//!
//! Every record read back from disk is verified against its checksum; any
//! mismatch aborts the open.

use crc32fast::Hasher;

/// Computes a CRC32 (IEEE) checksum over the provided bytes.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
