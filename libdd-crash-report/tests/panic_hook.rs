// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Installs a process-wide panic hook, so it lives in its own test binary.

use libdd_crash_report::{
    current_thread_id, install_panic_hook, CrashReport, CrashReportConfiguration,
    ExceptionCollector, LogLevel, MemoryLog, PANIC_EXCEPTION_TYPE,
};
use std::sync::{Arc, Mutex};

#[test]
#[cfg_attr(miri, ignore)]
fn panics_are_reported_and_chained() {
    let reports = Arc::new(Mutex::new(Vec::<CrashReport>::new()));
    let previous_hook_calls = Arc::new(Mutex::new(0));

    let calls = previous_hook_calls.clone();
    std::panic::set_hook(Box::new(move |_| {
        *calls.lock().unwrap() += 1;
    }));

    let log = Arc::new(MemoryLog::new());
    let collector =
        ExceptionCollector::new(CrashReportConfiguration::default()).with_log(log.clone());
    let sink_reports = reports.clone();
    install_panic_hook(collector, move |report: &CrashReport| {
        sink_reports.lock().unwrap().push(report.clone());
        Ok::<_, anyhow::Error>(())
    });

    let panicking_thread = std::thread::spawn(|| {
        let id = current_thread_id();
        let result = std::panic::catch_unwind(|| panic!("kaboom"));
        (id, result.is_err())
    });
    let (thread_id, panicked) = panicking_thread.join().unwrap();
    assert!(panicked);

    let _ = std::panic::take_hook();

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.exception_type, PANIC_EXCEPTION_TYPE);
    assert!(report.message.starts_with("kaboom at "));
    assert!(report.message.contains("panic_hook.rs"));
    assert_eq!(report.faulting_thread, thread_id);
    assert_eq!(report.threads.len(), 1);
    assert_eq!(report.threads[0].id, thread_id);
    assert!(!report.stack_trace.is_empty());
    assert_eq!(*previous_hook_calls.lock().unwrap(), 1);
    assert_eq!(log.count(LogLevel::Error), 0);
}
