// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! PE/COFF debug directory parsing for images mapped by the loader.
//!
//! Only the headers needed to reach the CodeView `RSDS` (PDB 7.0) record are read. Because the
//! image is mapped, every RVA is an offset from the image base and no section table lookup is
//! required. All offsets coming from the image are validated against `SizeOfImage` before being
//! dereferenced.

use super::byte_reader::ByteReader;
use super::error::{DebugInfoError, DebugInfoResult};
use super::memory::ReadMemory;
use super::{Architecture, DebugRecord};
use uuid::Uuid;

// DOS header
const DOS_HEADER_SIZE: usize = 0x40;
const MZ_SIGNATURE: u16 = 0x5A4D; // 'MZ' in little-endian.
const PE_POINTER_OFFSET: usize = 0x3C;
const MAX_PE_POINTER: u32 = 0x1_0000;

// NT headers: signature followed by the COFF file header.
const PE_SIGNATURE: u32 = 0x0000_4550; // 'PE\0\0' in little-endian.
const NT_FIXED_HEADERS_SIZE: usize = 0x18;
const MACHINE_OFFSET: usize = 0x4;
const SIZE_OF_OPTIONAL_HEADER_OFFSET: usize = 0x14;
const MAX_OPTIONAL_HEADER_SIZE: usize = 0x1000;

// Optional header, offsets relative to its start.
const PE32_EXECUTABLE: u16 = 0x10B;
const PE64_EXECUTABLE: u16 = 0x20B; // PE32+
const SIZE_OF_IMAGE_OFFSET: usize = 0x38;
const NUMBER_OF_RVA_AND_SIZES_PE32_OFFSET: usize = 0x5C;
const NUMBER_OF_RVA_AND_SIZES_PE64_OFFSET: usize = 0x6C;
const DATA_DIRECTORIES_PE32_OFFSET: usize = 0x60;
const DATA_DIRECTORIES_PE64_OFFSET: usize = 0x70;
const DATA_DIRECTORY_ENTRY_SIZE: usize = 0x8;
const DEBUG_DIRECTORY_INDEX: usize = 6;

// IMAGE_DEBUG_DIRECTORY
const DEBUG_DIRECTORY_ENTRY_SIZE: usize = 0x1C;
const MAX_DEBUG_DIRECTORY_ENTRIES: usize = 32;
const DEBUG_RECORD_TYPE_OFFSET: usize = 0xC;
const DEBUG_RECORD_SIZE_OFFSET: usize = 0x10;
const DEBUG_RECORD_RVA_OFFSET: usize = 0x14;
const DEBUG_RECORD_TYPE_CODEVIEW: u32 = 0x2;

// CV_INFO_PDB70
const CODEVIEW_PDB70_SIGNATURE: u32 = 0x5344_5352; // 'RSDS'
const CODEVIEW_GUID_OFFSET: usize = 0x4;
const CODEVIEW_AGE_OFFSET: usize = 0x14;
const CODEVIEW_PDB_FILE_NAME_OFFSET: usize = 0x18;
const MAX_CODEVIEW_RECORD_SIZE: u32 = 0x1000;

// IMAGE_FILE_HEADER.Machine
const IMAGE_FILE_MACHINE_I386: u16 = 0x014C;
const IMAGE_FILE_MACHINE_ARM: u16 = 0x01C0;
const IMAGE_FILE_MACHINE_ARMNT: u16 = 0x01C4;
const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
const IMAGE_FILE_MACHINE_ARM64: u16 = 0xAA64;

impl Architecture {
    pub fn from_pe_machine(machine: u16) -> Self {
        match machine {
            IMAGE_FILE_MACHINE_I386 => Architecture::X86,
            IMAGE_FILE_MACHINE_AMD64 => Architecture::X64,
            IMAGE_FILE_MACHINE_ARM | IMAGE_FILE_MACHINE_ARMNT => Architecture::Arm,
            IMAGE_FILE_MACHINE_ARM64 => Architecture::Arm64,
            _ => Architecture::Unknown,
        }
    }
}

/// Reads the CodeView debug record of the PE image mapped at `image_base`.
///
/// `Ok(None)` is the expected outcome for images that are not PE images, have no debug
/// directory, or only carry debug entries of another kind. Every inconsistency inside an image
/// that does claim to be a PE image is an error.
pub fn read_debug_record(
    memory: &dyn ReadMemory,
    image_base: u64,
) -> DebugInfoResult<Option<DebugRecord>> {
    let dos_header = memory.read(image_base, DOS_HEADER_SIZE)?;
    if dos_header.read16(0)? != MZ_SIGNATURE {
        return Ok(None);
    }

    let pe_header_offset = dos_header.read32(PE_POINTER_OFFSET)?;
    if (pe_header_offset as usize) < DOS_HEADER_SIZE || pe_header_offset > MAX_PE_POINTER {
        return Err(DebugInfoError::Malformed {
            what: "DOS header",
            reason: "e_lfanew points outside the header area",
        });
    }
    let nt_headers_address = image_base
        .checked_add(u64::from(pe_header_offset))
        .ok_or(DebugInfoError::AddressOverflow("NT headers"))?;

    let nt_headers = memory.read(nt_headers_address, NT_FIXED_HEADERS_SIZE)?;
    let signature = nt_headers.read32(0)?;
    if signature != PE_SIGNATURE {
        return Err(DebugInfoError::InvalidNtSignature(signature));
    }
    let machine = nt_headers.read16(MACHINE_OFFSET)?;
    let size_of_optional_header = nt_headers.read16(SIZE_OF_OPTIONAL_HEADER_OFFSET)? as usize;
    if size_of_optional_header > MAX_OPTIONAL_HEADER_SIZE {
        return Err(DebugInfoError::Malformed {
            what: "COFF file header",
            reason: "SizeOfOptionalHeader is implausibly large",
        });
    }

    let optional_header_address = nt_headers_address
        .checked_add(NT_FIXED_HEADERS_SIZE as u64)
        .ok_or(DebugInfoError::AddressOverflow("optional header"))?;
    let optional_header = memory.read(optional_header_address, size_of_optional_header)?;

    let (rva_count_offset, data_directories_offset) = match optional_header.read16(0)? {
        PE32_EXECUTABLE => (
            NUMBER_OF_RVA_AND_SIZES_PE32_OFFSET,
            DATA_DIRECTORIES_PE32_OFFSET,
        ),
        PE64_EXECUTABLE => (
            NUMBER_OF_RVA_AND_SIZES_PE64_OFFSET,
            DATA_DIRECTORIES_PE64_OFFSET,
        ),
        magic => return Err(DebugInfoError::UnsupportedOptionalHeader(magic)),
    };

    let size_of_image = optional_header.read32(SIZE_OF_IMAGE_OFFSET)?;
    let headers_end = u64::from(pe_header_offset)
        + NT_FIXED_HEADERS_SIZE as u64
        + size_of_optional_header as u64;
    if u64::from(size_of_image) < headers_end {
        return Err(DebugInfoError::Malformed {
            what: "optional header",
            reason: "SizeOfImage is smaller than the headers",
        });
    }
    image_base
        .checked_add(u64::from(size_of_image))
        .ok_or(DebugInfoError::AddressOverflow("end of image"))?;

    let number_of_rva_and_sizes = optional_header.read32(rva_count_offset)? as usize;
    if number_of_rva_and_sizes <= DEBUG_DIRECTORY_INDEX {
        return Ok(None);
    }
    let debug_data_directory =
        data_directories_offset + DEBUG_DIRECTORY_INDEX * DATA_DIRECTORY_ENTRY_SIZE;
    let debug_directory_rva = optional_header.read32(debug_data_directory)?;
    let debug_directory_size = optional_header.read32(debug_data_directory + 4)?;
    if debug_directory_rva == 0 || debug_directory_size == 0 {
        return Ok(None);
    }

    check_inside_image(
        "debug directory",
        debug_directory_rva,
        debug_directory_size,
        size_of_image,
    )?;
    if debug_directory_size as usize % DEBUG_DIRECTORY_ENTRY_SIZE != 0 {
        return Err(DebugInfoError::Malformed {
            what: "debug directory",
            reason: "size is not a multiple of the entry size",
        });
    }
    let entries = (debug_directory_size as usize / DEBUG_DIRECTORY_ENTRY_SIZE)
        .min(MAX_DEBUG_DIRECTORY_ENTRIES);
    let debug_directory = memory.read(
        image_base + u64::from(debug_directory_rva),
        entries * DEBUG_DIRECTORY_ENTRY_SIZE,
    )?;

    for entry in debug_directory.chunks_exact(DEBUG_DIRECTORY_ENTRY_SIZE) {
        if entry.read32(DEBUG_RECORD_TYPE_OFFSET)? != DEBUG_RECORD_TYPE_CODEVIEW {
            continue;
        }
        let debug_data_size = entry.read32(DEBUG_RECORD_SIZE_OFFSET)?;
        let debug_data_rva = entry.read32(DEBUG_RECORD_RVA_OFFSET)?;
        // Not mapped by the loader, only present in the file.
        if debug_data_rva == 0 {
            continue;
        }
        if let Some(record) = read_codeview_record(
            memory,
            image_base,
            debug_data_rva,
            debug_data_size,
            size_of_image,
        )? {
            return Ok(Some(DebugRecord {
                architecture: Architecture::from_pe_machine(machine),
                ..record
            }));
        }
    }

    Ok(None)
}

/// Returns `Ok(None)` for CodeView flavours other than PDB 7.0.
fn read_codeview_record(
    memory: &dyn ReadMemory,
    image_base: u64,
    rva: u32,
    size: u32,
    size_of_image: u32,
) -> DebugInfoResult<Option<DebugRecord>> {
    check_inside_image("CodeView record", rva, size, size_of_image)?;
    if size > MAX_CODEVIEW_RECORD_SIZE {
        return Err(DebugInfoError::Malformed {
            what: "CodeView record",
            reason: "record is larger than any symbol path",
        });
    }

    let record = memory.read(image_base + u64::from(rva), size as usize)?;
    if record.len() < 4 {
        return Err(DebugInfoError::Malformed {
            what: "CodeView record",
            reason: "record is shorter than its signature",
        });
    }
    if record.read32(0)? != CODEVIEW_PDB70_SIGNATURE {
        return Ok(None);
    }
    if record.len() < CODEVIEW_PDB_FILE_NAME_OFFSET {
        return Err(DebugInfoError::Malformed {
            what: "CodeView record",
            reason: "RSDS record is shorter than its header",
        });
    }

    let signature = Uuid::from_bytes_le(record.read_array(CODEVIEW_GUID_OFFSET)?);
    let age = record.read32(CODEVIEW_AGE_OFFSET)?;
    let file_name = &record[CODEVIEW_PDB_FILE_NAME_OFFSET..];
    let file_name = file_name
        .iter()
        .position(|byte| *byte == 0)
        .map_or(file_name, |nul| &file_name[..nul]);

    Ok(Some(DebugRecord {
        signature,
        age,
        symbol_path: String::from_utf8_lossy(file_name).into_owned(),
        image_size: size_of_image,
        architecture: Architecture::Unknown,
    }))
}

fn check_inside_image(
    what: &'static str,
    rva: u32,
    size: u32,
    size_of_image: u32,
) -> DebugInfoResult<()> {
    if u64::from(rva) + u64::from(size) > u64::from(size_of_image) {
        return Err(DebugInfoError::OutsideImage {
            what,
            rva: rva.into(),
            size: size.into(),
            image_size: size_of_image,
        });
    }
    Ok(())
}
