// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use libdd_crash_report::{
    CapturedException, CrashReportConfiguration, ExceptionCollector, ExceptionInfo, LogLevel,
    MemoryLog,
};
use std::sync::Arc;

#[test]
#[cfg_attr(miri, ignore)]
fn captured_reports_start_at_the_caller() {
    let exception = CapturedException::capture("System.InvalidOperationException", "boom");
    let log = Arc::new(MemoryLog::new());
    let collector =
        ExceptionCollector::new(CrashReportConfiguration::default()).with_log(log.clone());

    let report = collector.collect(Some(&exception));

    assert!(
        !report.stack_trace.contains("libdd_crash_report::"),
        "capture frames left in the trace:\n{}",
        report.stack_trace
    );
    assert!(!report.stack_trace.contains("backtrace::capture"));
    assert!(report
        .stack_trace
        .contains("captured_reports_start_at_the_caller"));
    assert!(report.threads[0].frames.len() <= exception.native_frames().len());
    assert_eq!(log.count(LogLevel::Error), 0);
}
