// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::exception::{CapturedException, ExceptionInfo};
use super::frames::{has_native_image, FrameExtractor};
use super::registry::BinaryRegistry;
use super::threading::current_thread_id;
use crate::debug_info::{DebugInfoParser, ProcessMemory, ReadMemory};
use crate::report::{
    sanitize_stack_trace, Binary, CrashReport, CrashReportBuilder, Frame, Thread,
};
use crate::shared::configuration::CrashReportConfiguration;
use crate::shared::constants::PLACEHOLDER_EXCEPTION_TYPE;
use crate::shared::log::{DiagnosticLog, LogLevel, TracingLog};
use anyhow::Context;
use chrono::Utc;
use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

/// Produces the optional free-form description attached to a report.
pub type DescriptionCallback =
    Box<dyn Fn(&dyn ExceptionInfo) -> anyhow::Result<String> + Send + Sync>;

thread_local! {
    static COLLECTING: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside [`ExceptionCollector::collect`].
pub(crate) fn is_collecting() -> bool {
    COLLECTING.with(Cell::get)
}

struct CollectingGuard {
    previous: bool,
}

impl CollectingGuard {
    fn enter() -> Self {
        Self {
            previous: COLLECTING.with(|collecting| collecting.replace(true)),
        }
    }
}

impl Drop for CollectingGuard {
    fn drop(&mut self) {
        COLLECTING.with(|collecting| collecting.set(self.previous));
    }
}

/// Turns exceptions into [`CrashReport`]s.
///
/// The description callback, the diagnostic log and the memory reader are all owned by the
/// collector; nothing is read from process-wide state.
pub struct ExceptionCollector {
    config: CrashReportConfiguration,
    description_callback: Option<DescriptionCallback>,
    log: Arc<dyn DiagnosticLog>,
    memory: Arc<dyn ReadMemory>,
}

impl ExceptionCollector {
    pub fn new(config: CrashReportConfiguration) -> Self {
        Self {
            config,
            description_callback: None,
            log: Arc::new(TracingLog),
            memory: Arc::new(ProcessMemory),
        }
    }

    pub fn with_description_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&dyn ExceptionInfo) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.description_callback = Some(Box::new(callback));
        self
    }

    pub fn with_log(mut self, log: Arc<dyn DiagnosticLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn ReadMemory>) -> Self {
        self.memory = memory;
        self
    }

    pub fn config(&self) -> &CrashReportConfiguration {
        &self.config
    }

    pub fn log(&self) -> &dyn DiagnosticLog {
        self.log.as_ref()
    }

    /// Builds the report for `exception` on the calling thread, which is recorded as the
    /// faulting thread.
    ///
    /// Never fails. A missing exception is replaced by a placeholder, and every internal failure
    /// degrades the report instead of aborting it.
    pub fn collect(&self, exception: Option<&dyn ExceptionInfo>) -> CrashReport {
        let _guard = CollectingGuard::enter();
        let placeholder;
        let exception: &dyn ExceptionInfo = match exception {
            Some(exception) => exception,
            None => {
                placeholder = CapturedException::placeholder();
                &placeholder
            }
        };
        let faulting_thread = current_thread_id();

        match self.build_report(exception, faulting_thread) {
            Ok(report) => report,
            Err(e) => {
                self.log.log(
                    LogLevel::Error,
                    &format!("Failed to assemble crash report, sending a minimal one: {e:#}"),
                );
                self.minimal_report(exception, faulting_thread)
            }
        }
    }

    fn build_report(
        &self,
        exception: &dyn ExceptionInfo,
        faulting_thread: u64,
    ) -> anyhow::Result<CrashReport> {
        let mut builder = CrashReportBuilder::new();
        builder.with_exception_type(exception_type(exception))?;
        builder.with_message(exception.message().to_string())?;
        builder.with_faulting_thread(faulting_thread)?;
        builder.with_timestamp_now()?;
        if let Err(e) = builder.with_process_info_this_process() {
            self.log.log(LogLevel::Debug, &format!("No process name: {e:#}"));
        }
        if let Some(description) = self.describe(exception) {
            builder.with_description(description)?;
        }

        let mut thread = Thread::new(faulting_thread);
        if has_native_image(exception) {
            let binaries = self.collect_native_frames(exception, &mut thread);
            builder.with_binaries(binaries)?;
        } else {
            self.log.log(
                LogLevel::Debug,
                "Innermost frame has no native image, skipping native frames",
            );
        }
        builder.with_thread(thread)?;

        builder.with_stack_trace(self.sanitize(exception.stack_trace()))?;
        builder.build()
    }

    /// Fills `thread` with the exception's frames and returns the binaries they belong to,
    /// parsing every distinct image once.
    fn collect_native_frames(
        &self,
        exception: &dyn ExceptionInfo,
        thread: &mut Thread,
    ) -> Vec<Binary> {
        let parser = DebugInfoParser::new(self.memory.as_ref(), self.log.as_ref());
        let mut registry = BinaryRegistry::new();
        let mut binaries = vec![];

        let mut frames = FrameExtractor::new(exception, self.log.as_ref());
        for frame in frames.by_ref().take(self.config.max_frames()) {
            thread.push_frame(Frame::new(frame.ip));

            let Some(image_base) = frame.image_base else {
                continue;
            };
            if !self.config.collect_binaries() || registry.seen(image_base) {
                continue;
            }
            registry.mark_seen(image_base);
            if let Some(record) = parser.parse(image_base) {
                binaries.push(Binary::new(image_base, &record));
            }
        }
        if frames.next().is_some() {
            self.log.log(
                LogLevel::Debug,
                &format!("Stack truncated to {} frames", self.config.max_frames()),
            );
        }
        binaries
    }

    fn sanitize(&self, raw: &str) -> String {
        match self.config.internal_frames_suffix() {
            Some(suffix) => sanitize_stack_trace(raw, suffix),
            None => raw.to_string(),
        }
    }

    fn describe(&self, exception: &dyn ExceptionInfo) -> Option<String> {
        let callback = self.description_callback.as_ref()?;
        let description = if std::thread::panicking() {
            describe_on_helper_thread(callback, exception)
        } else {
            catch_unwind(AssertUnwindSafe(|| callback(exception)))
                .unwrap_or_else(|payload| Err(panic_error(payload)))
        };
        match description {
            Ok(description) => Some(description),
            Err(e) => {
                self.log.log(
                    LogLevel::Error,
                    &format!("Description callback failed: {e:#}"),
                );
                None
            }
        }
    }

    fn minimal_report(&self, exception: &dyn ExceptionInfo, faulting_thread: u64) -> CrashReport {
        CrashReport {
            binaries: vec![],
            data_schema_version: CrashReport::current_schema_version(),
            description: None,
            exception_type: exception_type(exception),
            faulting_thread,
            id: Uuid::new_v4().to_string(),
            message: exception.message().to_string(),
            process_id: std::process::id(),
            process_name: None,
            stack_trace: self.sanitize(exception.stack_trace()),
            threads: vec![Thread::new(faulting_thread)],
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Runs `callback` on a short-lived thread and waits for it.
///
/// Used while the current thread is already panicking (e.g. inside a panic hook), where a second
/// panic aborts the process instead of unwinding.
fn describe_on_helper_thread(
    callback: &DescriptionCallback,
    exception: &dyn ExceptionInfo,
) -> anyhow::Result<String> {
    let snapshot = CapturedException::snapshot(exception);
    thread::scope(|scope| {
        let helper = thread::Builder::new()
            .name("crash-report-description".to_string())
            .spawn_scoped(scope, || {
                // The panic hook must not report panics raised by the callback itself.
                let _guard = CollectingGuard::enter();
                let exception: &dyn ExceptionInfo = &snapshot;
                callback(exception)
            })
            .context("Failed to spawn the description thread")?;
        helper
            .join()
            .unwrap_or_else(|payload| Err(panic_error(payload)))
    })
}

fn exception_type(exception: &dyn ExceptionInfo) -> String {
    let type_name = exception.type_name();
    if type_name.is_empty() {
        PLACEHOLDER_EXCEPTION_TYPE.to_string()
    } else {
        type_name.to_string()
    }
}

fn panic_error(payload: Box<dyn Any + Send + 'static>) -> anyhow::Error {
    // This pattern of String vs &str comes from
    // https://doc.rust-lang.org/std/panic/struct.PanicHookInfo.html#method.payload
    if let Some(s) = payload.downcast_ref::<String>() {
        anyhow::anyhow!("(panic) {s}")
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        anyhow::anyhow!("(panic) {s}")
    } else {
        anyhow::anyhow!("(panic) Unable to retrieve panic context")
    }
}
