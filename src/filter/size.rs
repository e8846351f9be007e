//! Size ceiling, expressed in binary MiB.

/// Default ceiling: 3 GiB expressed in MiB.
pub const DEFAULT_SIZE_LIMIT_MIB: f64 = 3.0 * 1024.0;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Convert a byte count to MiB (1 MiB = 1,048,576 bytes).
pub fn size_in_mib(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MIB
}

/// `true` when the size does not exceed `limit_mib`. The boundary is inclusive.
pub fn is_within_limit(size_bytes: u64, limit_mib: f64) -> bool {
    size_in_mib(size_bytes) <= limit_mib
}
