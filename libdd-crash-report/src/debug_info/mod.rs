// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod byte_reader;
mod error;
mod memory;
mod pe;

pub use error::*;
pub use memory::*;
pub use pe::read_debug_record;

use crate::shared::log::{DiagnosticLog, LogLevel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
    Unknown,
}

/// The part of an image's debug directory that identifies its symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRecord {
    pub signature: Uuid,
    pub age: u32,
    /// Symbol file path as stored by the linker, may be empty.
    pub symbol_path: String,
    pub image_size: u32,
    pub architecture: Architecture,
}

impl DebugRecord {
    /// Identifier used by the symbol server to find the matching symbol file: the signature as
    /// 32 lowercase hex digits without separators, directly followed by the decimal age.
    pub fn identifier(&self) -> String {
        format!("{}{}", self.signature.simple(), self.age)
    }
}

/// Extracts debug records while capturing a crash.
///
/// Failures never propagate: a corrupt image is reported to the diagnostic log and treated as
/// having no debug information.
pub struct DebugInfoParser<'a> {
    memory: &'a dyn ReadMemory,
    log: &'a dyn DiagnosticLog,
}

impl<'a> DebugInfoParser<'a> {
    pub fn new(memory: &'a dyn ReadMemory, log: &'a dyn DiagnosticLog) -> Self {
        Self { memory, log }
    }

    pub fn parse(&self, image_base: u64) -> Option<DebugRecord> {
        match read_debug_record(self.memory, image_base) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                self.log.log(
                    LogLevel::Debug,
                    &format!("Image at {image_base:#018x} has no CodeView debug record"),
                );
                None
            }
            Err(e) => {
                self.log.log(
                    LogLevel::Warn,
                    &format!("Failed to read debug info of image at {image_base:#018x}: {e}"),
                );
                None
            }
        }
    }
}
