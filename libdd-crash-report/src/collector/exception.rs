// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::constants::{
    PANIC_EXCEPTION_TYPE, PLACEHOLDER_EXCEPTION_MESSAGE, PLACEHOLDER_EXCEPTION_TYPE,
};
use backtrace::{Backtrace, BacktraceFrame};
use std::panic::PanicHookInfo;

/// Leading frames whose symbols all start with one of these belong to the capture machinery
/// (the unwinder, this module, the panic hook and the std panic runtime), not to the code that
/// raised the exception.
const CAPTURE_FRAME_PREFIXES: &[&str] = &[
    "backtrace::",
    "libdd_crash_report::collector::exception::CapturedException::",
    "libdd_crash_report::collector::panic_hook::install_panic_hook",
    "<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call",
    "std::panicking::",
    "std::panic::",
    "std::sys::backtrace::",
    "std::sys_common::backtrace::",
    "core::panicking::",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
];

fn is_capture_frame(frame: &BacktraceFrame) -> bool {
    let symbols = frame.symbols();
    !symbols.is_empty()
        && symbols.iter().all(|symbol| {
            symbol.name().is_some_and(|name| {
                let name = format!("{name:#}");
                CAPTURE_FRAME_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            })
        })
}

/// Drops the leading run of capture frames. Unresolved frames end the run.
fn trim_capture_frames(mut frames: Vec<BacktraceFrame>) -> Vec<BacktraceFrame> {
    let skip = frames
        .iter()
        .take_while(|frame| is_capture_frame(frame))
        .count();
    frames.split_off(skip)
}

/// One frame of the native stack as snapshotted when the exception was raised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NativeFrame {
    pub ip: Option<u64>,
    pub image_base: Option<u64>,
    /// Whether the runtime could associate this frame with a loaded native image at all.
    pub has_native_image: bool,
}

impl NativeFrame {
    pub fn new(ip: u64, image_base: u64) -> Self {
        Self {
            ip: Some(ip),
            image_base: Some(image_base),
            has_native_image: true,
        }
    }

    /// A frame the runtime could not map to native code, e.g. an interpreted one.
    pub fn unresolved() -> Self {
        Self::default()
    }

    fn from_backtrace(frame: &backtrace::BacktraceFrame) -> Self {
        let ip = Some(frame.ip() as usize as u64).filter(|ip| *ip != 0);
        let image_base = frame
            .module_base_address()
            .map(|base| base as usize as u64)
            .filter(|base| *base != 0)
            .or_else(|| ip.and_then(image_base_of));
        Self {
            ip,
            image_base,
            has_native_image: image_base.is_some(),
        }
    }
}

/// Looks up the image containing `ip` with the dynamic loader.
#[cfg(unix)]
fn image_base_of(ip: u64) -> Option<u64> {
    let mut info = libc::Dl_info {
        dli_fname: std::ptr::null(),
        dli_fbase: std::ptr::null_mut(),
        dli_sname: std::ptr::null(),
        dli_saddr: std::ptr::null_mut(),
    };
    // SAFETY: dladdr only inspects the loader's tables; any address value is accepted.
    let res = unsafe { libc::dladdr(ip as usize as *const libc::c_void, &mut info) };
    if res == 0 || info.dli_fbase.is_null() {
        return None;
    }
    Some(info.dli_fbase as usize as u64)
}

#[cfg(not(unix))]
fn image_base_of(_ip: u64) -> Option<u64> {
    None
}

/// What the collector needs to know about the exception being reported.
pub trait ExceptionInfo {
    fn type_name(&self) -> &str;
    fn message(&self) -> &str;
    /// Textual trace as rendered by the runtime, before sanitization.
    fn stack_trace(&self) -> &str;
    /// Innermost frame first.
    fn native_frames(&self) -> &[NativeFrame];
}

/// An owned exception snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CapturedException {
    type_name: String,
    message: String,
    stack_trace: String,
    frames: Vec<NativeFrame>,
}

impl CapturedException {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Stands in for an exception that was lost before it reached the collector.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_EXCEPTION_TYPE, PLACEHOLDER_EXCEPTION_MESSAGE)
    }

    /// Copies any exception into an owned snapshot.
    pub fn snapshot(exception: &dyn ExceptionInfo) -> Self {
        Self::new(exception.type_name(), exception.message())
            .with_stack_trace(exception.stack_trace())
            .with_frames(exception.native_frames().to_vec())
    }

    /// Snapshots the calling thread's stack, starting at the caller.
    #[inline(never)]
    pub fn capture(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let frames = trim_capture_frames(Backtrace::new().into());
        let native_frames = frames.iter().map(NativeFrame::from_backtrace).collect();
        let backtrace = Backtrace::from(frames);
        Self::new(type_name, message)
            .with_stack_trace(format!("{backtrace:?}"))
            .with_frames(native_frames)
    }

    #[inline(never)]
    pub fn from_panic(panic_info: &PanicHookInfo<'_>) -> Self {
        // This pattern of String vs &str comes from
        // https://doc.rust-lang.org/std/panic/struct.PanicHookInfo.html#method.payload
        let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unable to retrieve panic context".to_string()
        };
        let message = match panic_info.location() {
            Some(location) => format!("{payload} at {location}"),
            None => payload,
        };
        Self::capture(PANIC_EXCEPTION_TYPE, message)
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    pub fn with_frames(mut self, frames: Vec<NativeFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_frame(mut self, frame: NativeFrame) -> Self {
        self.frames.push(frame);
        self
    }
}

impl ExceptionInfo for CapturedException {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    fn native_frames(&self) -> &[NativeFrame] {
        &self.frames
    }
}
