//! Frame start synchronization for an unframed RTU byte stream
//!
//! RTU carries no marker, so the only start signal is a byte that could be a
//! unicast slave address. A register value inside a payload can look exactly
//! like one; callers must treat the returned offset as a candidate.

use crate::constants::{MAX_SLAVE_ADDRESS, MIN_FRAME_SIZE, MIN_SLAVE_ADDRESS};

/// Check whether `byte` is a unicast slave address (1..=247)
pub const fn is_slave_address(byte: u8) -> bool {
    byte >= MIN_SLAVE_ADDRESS && byte <= MAX_SLAVE_ADDRESS
}

/// Find the offset of the first plausible frame start
///
/// Scans forward for the first byte in 1..=247. Returns `None` when there is
/// no such byte, or when fewer than [`MIN_FRAME_SIZE`] bytes remain from it.
pub fn find_start(buffer: &[u8]) -> Option<usize> {
    let offset = buffer.iter().position(|&b| is_slave_address(b))?;

    if buffer.len() - offset < MIN_FRAME_SIZE {
        return None;
    }

    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_range() {
        assert!(!is_slave_address(0));
        assert!(is_slave_address(1));
        assert!(is_slave_address(247));
        assert!(!is_slave_address(248));
        assert!(!is_slave_address(0xFF));
    }

    #[test]
    fn test_find_start_at_zero() {
        assert_eq!(find_start(&[0x01, 0x03, 0x02, 0x00, 0x01]), Some(0));
    }

    #[test]
    fn test_find_start_skips_broadcast_and_high_bytes() {
        let data = [0x00, 0xF8, 0xFF, 0x06, 0x10, 0x00, 0x01, 0x00];
        assert_eq!(find_start(&data), Some(3));
    }

    #[test]
    fn test_find_start_requires_min_frame() {
        // Candidate at offset 1 with only 4 bytes after it
        assert_eq!(find_start(&[0x00, 0x01, 0x03, 0x02, 0x00]), None);
        assert_eq!(find_start(&[]), None);
        assert_eq!(find_start(&[0x00; 16]), None);
    }
}
