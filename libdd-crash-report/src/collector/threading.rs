// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Returns a numeric identifier for the current OS thread.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn current_thread_id() -> u64 {
    // SAFETY: syscall(SYS_gettid) has no preconditions for current thread.
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

/// Returns a numeric identifier for the current OS thread.
#[cfg(target_os = "macos")]
pub fn current_thread_id() -> u64 {
    let mut tid: u64 = 0;
    // SAFETY: `pthread_threadid_np` has no preconditions for current thread
    // when pthread_t is 0 and output pointer is valid.
    let rc = unsafe { libc::pthread_threadid_np(0, &mut tid) };
    debug_assert_eq!(rc, 0, "pthread_threadid_np failed: {rc}");
    tid
}

/// Returns a numeric identifier for the current OS thread.
#[cfg(windows)]
pub fn current_thread_id() -> u64 {
    // SAFETY: GetCurrentThreadId has no preconditions.
    u64::from(unsafe { windows::Win32::System::Threading::GetCurrentThreadId() })
}

/// Returns an identifier unique to the current thread for the lifetime of the process.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    windows
)))]
pub fn current_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static THREAD_ID: u64 = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    }
    THREAD_ID.with(|id| *id)
}
