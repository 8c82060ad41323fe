// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod address;
mod binary;
mod builder;
mod sanitizer;

pub use address::*;
pub use binary::*;
pub use builder::*;
pub use sanitizer::*;

use crate::shared::constants::REPORT_SCHEMA_VERSION;
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};

/// A symbolicatable record of one unhandled exception.
///
/// Built once per crash by the collector and handed unchanged to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CrashReport {
    pub binaries: Vec<Binary>,
    pub data_schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub exception_type: String,
    pub faulting_thread: u64,
    pub id: String,
    pub message: String,
    pub process_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    pub stack_trace: String,
    pub threads: Vec<Thread>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Thread {
    /// Innermost frame first.
    pub frames: Vec<Frame>,
    pub id: u64,
}

impl Thread {
    pub fn new(id: u64) -> Self {
        Self {
            frames: vec![],
            id,
        }
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    pub address: String,
}

impl Frame {
    pub fn new(ip: u64) -> Self {
        Self {
            address: format_address(ip),
        }
    }
}

impl CrashReport {
    pub fn current_schema_version() -> String {
        REPORT_SCHEMA_VERSION.to_string()
    }

    pub fn faulting_thread(&self) -> Option<&Thread> {
        self.threads
            .iter()
            .find(|thread| thread.id == self.faulting_thread)
    }

    /// Emit the report as structured json in file `path`.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::options()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("Failed to write json to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_info::{Architecture, DebugRecord};
    use uuid::Uuid;

    fn test_report() -> anyhow::Result<CrashReport> {
        let record = DebugRecord {
            signature: Uuid::from_u128(0x1234),
            age: 2,
            symbol_path: "C:\\out\\service.pdb".to_string(),
            image_size: 0x1000,
            architecture: Architecture::X64,
        };
        let mut thread = Thread::new(77);
        thread.push_frame(Frame::new(0x1_0010));
        thread.push_frame(Frame::new(0x1_0020));

        let mut builder = CrashReportBuilder::new();
        builder.with_exception_type("System.InvalidOperationException".to_string())?;
        builder.with_message("Sequence contains no elements".to_string())?;
        builder.with_faulting_thread(77)?;
        builder.with_thread(thread)?;
        builder.with_binary(Binary::new(0x1_0000, &record))?;
        builder.with_stack_trace("at Service.Run()".to_string())?;
        builder.with_process_id(4242)?;
        builder.build()
    }

    #[test]
    fn test_faulting_thread_lookup() -> anyhow::Result<()> {
        let report = test_report()?;
        let thread = report.faulting_thread().context("faulting thread")?;
        assert_eq!(thread.frames.len(), 2);
        assert_eq!(thread.frames[0].address, "0x0000000000010010");
        Ok(())
    }

    #[test]
    fn test_json_layout() -> anyhow::Result<()> {
        let report = test_report()?;
        let json = serde_json::to_value(&report)?;

        assert_eq!(json["data_schema_version"], "1.0");
        assert_eq!(json["binaries"][0]["name"], "service");
        assert_eq!(json["binaries"][0]["architecture"], "x64");
        assert_eq!(json["threads"][0]["frames"][1]["address"], "0x0000000000010020");
        assert!(json.get("description").is_none());
        assert!(json.get("process_name").is_none());

        let parsed: CrashReport = serde_json::from_value(json)?;
        assert_eq!(parsed, report);
        Ok(())
    }

    #[test]
    fn test_schema_names_every_field() -> anyhow::Result<()> {
        let schema = serde_json::to_value(schemars::schema_for!(CrashReport))?;
        let required = schema["required"]
            .as_array()
            .context("required fields")?
            .iter()
            .filter_map(|field| field.as_str())
            .collect::<Vec<_>>();
        for field in ["binaries", "faulting_thread", "id", "stack_trace", "threads"] {
            assert!(required.contains(&field), "{field} should be required");
        }
        assert!(!required.contains(&"description"));
        Ok(())
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_to_file() -> anyhow::Result<()> {
        let report = test_report()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");

        report.to_file(&path)?;
        // A second write replaces the first instead of appending to it.
        report.to_file(&path)?;

        let parsed: CrashReport = serde_json::from_reader(File::open(&path)?)?;
        assert_eq!(parsed, report);
        Ok(())
    }
}
