// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::error::MemoryError;

/// Read-only access to the memory holding the loaded images.
///
/// Implementations must report unmapped or unreadable ranges as an error and never fault:
/// images can be unloaded or relocated between the time the stack was snapshotted and the
/// time its headers are parsed.
pub trait ReadMemory: Send + Sync {
    fn read(&self, address: u64, len: usize) -> Result<Vec<u8>, MemoryError>;
}

/// Memory of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMemory;

impl ReadMemory for ProcessMemory {
    fn read(&self, address: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        read_process_memory(address, len)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn read_process_memory(address: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
    use nix::sys::uio::{process_vm_readv, RemoteIoVec};
    use nix::unistd::Pid;
    use std::io::IoSliceMut;

    let base = usize::try_from(address).map_err(|_| MemoryError::Unreadable { address, len })?;
    let mut buffer = vec![0u8; len];
    // process_vm_readv validates the remote range in the kernel, an unmapped page yields EFAULT
    // instead of a SIGSEGV in the crashing process.
    let read = {
        let mut local = [IoSliceMut::new(&mut buffer)];
        let remote = [RemoteIoVec { base, len }];
        process_vm_readv(Pid::this(), &mut local, &remote).map_err(|errno| match errno {
            nix::errno::Errno::EFAULT => MemoryError::Unreadable { address, len },
            errno => MemoryError::Os(errno as i32),
        })?
    };
    if read != len {
        return Err(MemoryError::ShortRead { address, read, len });
    }
    Ok(buffer)
}

#[cfg(windows)]
fn read_process_memory(address: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
    use std::ffi::c_void;
    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Threading::GetCurrentProcess;

    let mut buffer = vec![0u8; len];
    let mut bytes_read = 0usize;
    // SAFETY: ReadProcessMemory checks the source range and reports unreadable pages as an
    // error. The destination buffer is exactly `len` bytes long.
    let result = unsafe {
        ReadProcessMemory(
            GetCurrentProcess(),
            address as usize as *const c_void,
            buffer.as_mut_ptr() as *mut c_void,
            len,
            Some(&mut bytes_read as *mut usize),
        )
    };
    if result.is_err() {
        return Err(MemoryError::Unreadable { address, len });
    }
    if bytes_read != len {
        return Err(MemoryError::ShortRead {
            address,
            read: bytes_read,
            len,
        });
    }
    Ok(buffer)
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
fn read_process_memory(_address: u64, _len: usize) -> Result<Vec<u8>, MemoryError> {
    Err(MemoryError::Unsupported)
}

/// Copies of memory regions, each mapped at the address it had in the process.
///
/// Useful when the images were captured ahead of time (e.g. from a dump) and for tests.
#[derive(Debug, Default, Clone)]
pub struct SnapshotMemory {
    regions: Vec<(u64, Vec<u8>)>,
}

impl SnapshotMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, base: u64, bytes: impl Into<Vec<u8>>) -> Self {
        self.map(base, bytes);
        self
    }

    pub fn map(&mut self, base: u64, bytes: impl Into<Vec<u8>>) {
        self.regions.push((base, bytes.into()));
    }
}

impl ReadMemory for SnapshotMemory {
    fn read(&self, address: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        let unreadable = MemoryError::Unreadable { address, len };
        for (base, bytes) in &self.regions {
            let Some(offset) = address.checked_sub(*base) else {
                continue;
            };
            let Ok(offset) = usize::try_from(offset) else {
                continue;
            };
            if offset >= bytes.len() && len > 0 {
                continue;
            }
            let end = offset.checked_add(len).ok_or(unreadable.clone())?;
            // Reads never straddle two regions
            return bytes
                .get(offset..end)
                .map(<[u8]>::to_vec)
                .ok_or(unreadable);
        }
        Err(unreadable)
    }
}
