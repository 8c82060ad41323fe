// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::error::{DebugInfoError, DebugInfoResult};

/// Bounds-checked little-endian field access over a header copied out of process memory.
pub(crate) trait ByteReader {
    fn read_array<const N: usize>(&self, index: usize) -> DebugInfoResult<[u8; N]>;

    fn read16(&self, index: usize) -> DebugInfoResult<u16> {
        self.read_array(index).map(u16::from_le_bytes)
    }

    fn read32(&self, index: usize) -> DebugInfoResult<u32> {
        self.read_array(index).map(u32::from_le_bytes)
    }
}

impl ByteReader for [u8] {
    fn read_array<const N: usize>(&self, index: usize) -> DebugInfoResult<[u8; N]> {
        let out_of_bounds = DebugInfoError::OutOfBoundsRead {
            index,
            len: self.len(),
        };
        let end = index.checked_add(N).ok_or(out_of_bounds.clone())?;
        let bytes = self.get(index..end).ok_or(out_of_bounds)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read16() {
        let buffer = [0x12u8, 0x34, 0x56, 0x78];
        assert_eq!(buffer.read16(0).unwrap(), 0x3412);
        assert_eq!(buffer.read16(2).unwrap(), 0x7856);
        assert!(buffer.read16(3).is_err());
    }

    #[test]
    fn test_read32() {
        let buffer = [0x12u8, 0x34, 0x56, 0x78];
        assert_eq!(buffer.read32(0).unwrap(), 0x78563412);
        assert!(buffer.read32(1).is_err());
    }

    #[test]
    fn test_read_array() {
        let buffer = [1u8, 2, 3, 4, 5];
        assert_eq!(buffer.read_array::<3>(2).unwrap(), [3, 4, 5]);
        assert_eq!(buffer.read_array::<0>(5).unwrap(), [0u8; 0]);
        assert!(buffer.read_array::<3>(3).is_err());
    }

    #[test]
    fn test_error_out_of_bounds_read() {
        let buffer = [0x12u8, 0x34];
        assert_eq!(
            buffer.read16(1).unwrap_err(),
            DebugInfoError::OutOfBoundsRead { index: 1, len: 2 }
        );
        assert_eq!(
            buffer.read32(usize::MAX - 1).unwrap_err(),
            DebugInfoError::OutOfBoundsRead {
                index: usize::MAX - 1,
                len: 2
            }
        );
    }
}
