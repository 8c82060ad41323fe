// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, PartialEq)]
pub struct CrashReportBuilder {
    pub binaries: Option<Vec<Binary>>,
    pub description: Option<String>,
    pub exception_type: Option<String>,
    pub faulting_thread: Option<u64>,
    pub message: Option<String>,
    pub process_id: Option<u32>,
    pub process_name: Option<String>,
    pub stack_trace: Option<String>,
    pub threads: Option<Vec<Thread>>,
    pub timestamp: Option<DateTime<Utc>>,
    pub uuid: Uuid,
}

impl Default for CrashReportBuilder {
    fn default() -> Self {
        Self {
            binaries: None,
            description: None,
            exception_type: None,
            faulting_thread: None,
            message: None,
            process_id: None,
            process_name: None,
            stack_trace: None,
            threads: None,
            timestamp: None,
            uuid: Uuid::new_v4(),
        }
    }
}

impl CrashReportBuilder {
    pub fn build(self) -> anyhow::Result<CrashReport> {
        let exception_type = self
            .exception_type
            .context("required field 'exception_type' missing")?;
        let faulting_thread = self
            .faulting_thread
            .context("required field 'faulting_thread' missing")?;
        let threads = self.threads.unwrap_or_default();
        let occurrences = threads
            .iter()
            .filter(|thread| thread.id == faulting_thread)
            .count();
        anyhow::ensure!(
            occurrences == 1,
            "faulting thread {faulting_thread} recorded {occurrences} times"
        );

        let binaries = self.binaries.unwrap_or_default();
        let mut starts = HashSet::with_capacity(binaries.len());
        for binary in &binaries {
            let start = parse_address(&binary.start_address)
                .with_context(|| format!("invalid start address {}", binary.start_address))?;
            let end = parse_address(&binary.end_address)
                .with_context(|| format!("invalid end address {}", binary.end_address))?;
            anyhow::ensure!(
                start <= end,
                "binary {} ends before it starts",
                binary.start_address
            );
            anyhow::ensure!(
                starts.insert(start),
                "binary {} recorded twice",
                binary.start_address
            );
        }

        let timestamp = self
            .timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        Ok(CrashReport {
            binaries,
            data_schema_version: CrashReport::current_schema_version(),
            description: self.description,
            exception_type,
            faulting_thread,
            id: self.uuid.to_string(),
            message: self.message.unwrap_or_default(),
            process_id: self.process_id.unwrap_or_else(std::process::id),
            process_name: self.process_name,
            stack_trace: self.stack_trace.unwrap_or_default(),
            threads,
            timestamp,
        })
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(&mut self, binary: Binary) -> anyhow::Result<()> {
        if let Some(binaries) = &mut self.binaries {
            binaries.push(binary);
        } else {
            self.binaries = Some(vec![binary]);
        }
        Ok(())
    }

    pub fn with_binaries(&mut self, binaries: Vec<Binary>) -> anyhow::Result<()> {
        self.binaries = Some(binaries);
        Ok(())
    }

    /// Blank descriptions carry no information and are dropped.
    pub fn with_description(&mut self, description: String) -> anyhow::Result<()> {
        if description.trim().is_empty() {
            return Ok(());
        }
        self.description = Some(description);
        Ok(())
    }

    pub fn with_exception_type(&mut self, exception_type: String) -> anyhow::Result<()> {
        anyhow::ensure!(
            !exception_type.is_empty(),
            "Expect non-empty exception type"
        );
        self.exception_type = Some(exception_type);
        Ok(())
    }

    pub fn with_faulting_thread(&mut self, thread_id: u64) -> anyhow::Result<()> {
        self.faulting_thread = Some(thread_id);
        Ok(())
    }

    pub fn with_message(&mut self, message: String) -> anyhow::Result<()> {
        self.message = Some(message);
        Ok(())
    }

    pub fn with_process_id(&mut self, process_id: u32) -> anyhow::Result<()> {
        self.process_id = Some(process_id);
        Ok(())
    }

    pub fn with_process_name(&mut self, process_name: String) -> anyhow::Result<()> {
        if process_name.is_empty() {
            return Ok(());
        }
        self.process_name = Some(process_name);
        Ok(())
    }

    pub fn with_process_info_this_process(&mut self) -> anyhow::Result<()> {
        self.with_process_id(std::process::id())?;
        let exe = std::env::current_exe().context("current executable")?;
        if let Some(name) = exe.file_name() {
            self.with_process_name(name.to_string_lossy().into_owned())?;
        }
        Ok(())
    }

    pub fn with_stack_trace(&mut self, stack_trace: String) -> anyhow::Result<()> {
        self.stack_trace = Some(stack_trace);
        Ok(())
    }

    pub fn with_thread(&mut self, thread: Thread) -> anyhow::Result<()> {
        if let Some(threads) = &mut self.threads {
            threads.push(thread);
        } else {
            self.threads = Some(vec![thread]);
        }
        Ok(())
    }

    pub fn with_threads(&mut self, threads: Vec<Thread>) -> anyhow::Result<()> {
        self.threads = Some(threads);
        Ok(())
    }

    pub fn with_timestamp(&mut self, timestamp: DateTime<Utc>) -> anyhow::Result<()> {
        self.timestamp = Some(timestamp);
        Ok(())
    }

    pub fn with_timestamp_now(&mut self) -> anyhow::Result<()> {
        self.with_timestamp(Utc::now())?;
        Ok(())
    }

    pub fn with_uuid(&mut self, uuid: Uuid) -> anyhow::Result<()> {
        self.uuid = uuid;
        Ok(())
    }
}
