// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use libdd_crash_report::{
    CapturedException, CrashReport, CrashReportConfiguration, ExceptionCollector, FileSink,
    MemoryLog, NativeFrame, ReportSink, SnapshotMemory,
};
use std::sync::Arc;

#[test]
#[cfg_attr(miri, ignore)]
fn reports_survive_the_trip_through_a_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = FileSink::new(dir.path())?;
    let collector = ExceptionCollector::new(CrashReportConfiguration::default())
        .with_log(Arc::new(MemoryLog::new()))
        .with_memory(Arc::new(SnapshotMemory::new()))
        .with_description_callback(|exception| Ok(format!("{} in worker", exception.type_name())));
    let exception = CapturedException::new("System.TimeoutException", "gave up")
        .with_stack_trace("   at Worker.Poll()")
        .with_frame(NativeFrame::new(0x1_0010, 0x1_0000));

    let report = collector.collect(Some(&exception));
    sink.send(&report)?;

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(sink.path_for(&report))?)?;
    assert_eq!(json["exception_type"], "System.TimeoutException");
    assert_eq!(json["description"], "System.TimeoutException in worker");
    assert_eq!(json["threads"][0]["frames"][0]["address"], "0x0000000000010010");
    assert_eq!(json["binaries"], serde_json::json!([]));

    let parsed: CrashReport = serde_json::from_value(json)?;
    assert_eq!(parsed, report);
    Ok(())
}
