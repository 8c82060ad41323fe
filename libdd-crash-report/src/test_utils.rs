// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Synthetic PE images laid out the way the loader maps them.

pub const NT_HEADERS_OFFSET: usize = 0x80;
pub const DEBUG_DIRECTORY_RVA: u32 = 0x400;
pub const CODEVIEW_RVA: u32 = 0x800;

const IMAGE_FILE_MACHINE_I386: u16 = 0x014C;
const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

#[derive(Debug, Clone)]
pub struct PeImageBuilder {
    age: u32,
    codeview_signature: u32,
    debug_directory: bool,
    debug_directory_size: u32,
    debug_type: u32,
    guid: [u8; 16],
    machine: u16,
    number_of_rva_and_sizes: u32,
    pdb_path: String,
    pe32_plus: bool,
    size_of_image: u32,
}

impl Default for PeImageBuilder {
    fn default() -> Self {
        Self {
            age: 1,
            codeview_signature: u32::from_le_bytes(*b"RSDS"),
            debug_directory: true,
            debug_directory_size: 0x1C,
            debug_type: 2,
            guid: [
                0x78, 0x56, 0x34, 0x12, 0x34, 0x12, 0x78, 0x56, 0x9a, 0xbc, 0xde, 0xf0, 0x12, 0x34,
                0x56, 0x78,
            ],
            machine: IMAGE_FILE_MACHINE_AMD64,
            number_of_rva_and_sizes: 16,
            pdb_path: "C:\\build\\app.pdb".to_string(),
            pe32_plus: true,
            size_of_image: Self::DEFAULT_SIZE_OF_IMAGE,
        }
    }
}

impl PeImageBuilder {
    pub const DEFAULT_SIZE_OF_IMAGE: u32 = 0x2000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn pe32(mut self) -> Self {
        self.pe32_plus = false;
        self.machine = IMAGE_FILE_MACHINE_I386;
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_codeview_signature(mut self, signature: u32) -> Self {
        self.codeview_signature = signature;
        self
    }

    pub fn with_debug_directory_size(mut self, size: u32) -> Self {
        self.debug_directory_size = size;
        self
    }

    pub fn with_debug_type(mut self, debug_type: u32) -> Self {
        self.debug_type = debug_type;
        self
    }

    /// GUID bytes in their on-disk (mixed-endian) order.
    pub fn with_guid_bytes(mut self, guid: [u8; 16]) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_number_of_rva_and_sizes(mut self, count: u32) -> Self {
        self.number_of_rva_and_sizes = count;
        self
    }

    pub fn with_pdb_path(mut self, path: &str) -> Self {
        self.pdb_path = path.to_string();
        self
    }

    pub fn without_debug_directory(mut self) -> Self {
        self.debug_directory = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; self.size_of_image as usize];

        // DOS header
        put16(&mut image, 0, 0x5A4D);
        put32(&mut image, 0x3C, NT_HEADERS_OFFSET as u32);

        // NT signature and COFF file header
        put32(&mut image, NT_HEADERS_OFFSET, 0x0000_4550);
        put16(&mut image, NT_HEADERS_OFFSET + 0x4, self.machine);
        let (magic, size_of_optional_header, rva_count_offset, data_directories_offset) =
            if self.pe32_plus {
                (0x20Bu16, 0xF0u16, 0x6C, 0x70)
            } else {
                (0x10B, 0xE0, 0x5C, 0x60)
            };
        put16(&mut image, NT_HEADERS_OFFSET + 0x14, size_of_optional_header);

        // Optional header
        let optional_header = NT_HEADERS_OFFSET + 0x18;
        put16(&mut image, optional_header, magic);
        put32(&mut image, optional_header + 0x38, self.size_of_image);
        put32(
            &mut image,
            optional_header + rva_count_offset,
            self.number_of_rva_and_sizes,
        );
        if !self.debug_directory {
            return image;
        }
        let debug_data_directory = optional_header + data_directories_offset + 6 * 8;
        put32(&mut image, debug_data_directory, DEBUG_DIRECTORY_RVA);
        put32(&mut image, debug_data_directory + 4, self.debug_directory_size);

        // IMAGE_DEBUG_DIRECTORY
        let codeview_size = 0x18 + self.pdb_path.len() as u32 + 1;
        let entry = DEBUG_DIRECTORY_RVA as usize;
        put32(&mut image, entry + 0xC, self.debug_type);
        put32(&mut image, entry + 0x10, codeview_size);
        put32(&mut image, entry + 0x14, CODEVIEW_RVA);
        put32(&mut image, entry + 0x18, CODEVIEW_RVA);

        // CV_INFO_PDB70
        let record = CODEVIEW_RVA as usize;
        put32(&mut image, record, self.codeview_signature);
        image[record + 0x4..record + 0x14].copy_from_slice(&self.guid);
        put32(&mut image, record + 0x14, self.age);
        let path = record + 0x18;
        image[path..path + self.pdb_path.len()].copy_from_slice(self.pdb_path.as_bytes());
        image
    }
}

fn put16(image: &mut [u8], offset: usize, value: u16) {
    image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
