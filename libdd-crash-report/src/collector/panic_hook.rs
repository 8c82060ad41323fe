// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::exception::CapturedException;
use super::exception_collector::{is_collecting, ExceptionCollector};
use crate::report::CrashReport;
use crate::shared::log::LogLevel;
use anyhow::Context;
use std::panic;
use std::path::PathBuf;

/// Receives finished reports, e.g. to upload them.
pub trait ReportSink: Send + Sync {
    fn send(&self, report: &CrashReport) -> anyhow::Result<()>;
}

impl<F> ReportSink for F
where
    F: Fn(&CrashReport) -> anyhow::Result<()> + Send + Sync,
{
    fn send(&self, report: &CrashReport) -> anyhow::Result<()> {
        self(report)
    }
}

/// Writes every report as `<directory>/<report id>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create {}", directory.display()))?;
        Ok(Self { directory })
    }

    pub fn path_for(&self, report: &CrashReport) -> PathBuf {
        self.directory.join(format!("{}.json", report.id))
    }
}

impl ReportSink for FileSink {
    fn send(&self, report: &CrashReport) -> anyhow::Result<()> {
        report.to_file(&self.path_for(report))
    }
}

/// Reports every panic of the process through `collector` and `sink`, then runs the hook that
/// was installed before.
///
/// Panics raised while a report is being collected on the same thread (e.g. by the description
/// callback) are only passed on to the previous hook.
pub fn install_panic_hook(collector: ExceptionCollector, sink: impl ReportSink + 'static) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if !is_collecting() {
            let exception = CapturedException::from_panic(panic_info);
            let report = collector.collect(Some(&exception));
            if let Err(e) = sink.send(&report) {
                collector.log().log(
                    LogLevel::Error,
                    &format!("Failed to send crash report {}: {e:#}", report.id),
                );
            }
        }
        previous_hook(panic_info);
    }));
}
