// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("{len} bytes at {address:#018x} are not readable")]
    Unreadable { address: u64, len: usize },
    #[error("short read at {address:#018x}: got {read} of {len} bytes")]
    ShortRead { address: u64, read: usize, len: usize },
    #[error("reading process memory failed with os error {0}")]
    Os(i32),
    #[error("reading process memory is not supported on this platform")]
    Unsupported,
}

/// Why an image that looked like a PE image could not yield a debug record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugInfoError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("invalid NT headers signature {0:#010x}")]
    InvalidNtSignature(u32),
    #[error("unsupported optional header magic {0:#06x}")]
    UnsupportedOptionalHeader(u16),
    #[error("out of bounds read at index {index} of a {len} byte buffer")]
    OutOfBoundsRead { index: usize, len: usize },
    #[error("{what} at rva {rva:#x} with size {size:#x} lies outside the image of size {image_size:#x}")]
    OutsideImage {
        what: &'static str,
        rva: u64,
        size: u64,
        image_size: u32,
    },
    #[error("address overflow while locating the {0}")]
    AddressOverflow(&'static str),
    #[error("malformed {what}: {reason}")]
    Malformed {
        what: &'static str,
        reason: &'static str,
    },
}

pub type DebugInfoResult<T> = Result<T, DebugInfoError>;
