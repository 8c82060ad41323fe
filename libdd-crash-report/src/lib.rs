// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Crash capture for unhandled exceptions.
//!
//! Given an exception whose native call stack was snapshotted by the runtime, this crate walks
//! the frames, resolves every distinct image base once to its PE CodeView debug record, and
//! assembles a [`CrashReport`] that can be symbolicated offline.
//!
//! Capture never fails: a lost exception is replaced by a placeholder, corrupt images are
//! skipped, and a misbehaving description callback only costs the description.
//!
//! ```no_run
//! use libdd_crash_report::{CapturedException, CrashReportConfiguration, ExceptionCollector};
//!
//! let collector = ExceptionCollector::new(CrashReportConfiguration::default())
//!     .with_description_callback(|exception| Ok(format!("while handling {}", exception.type_name())));
//! let exception = CapturedException::capture("IoError", "disk full");
//! let report = collector.collect(Some(&exception));
//! assert_eq!(report.threads.len(), 1);
//! ```

mod collector;
mod debug_info;
mod report;
mod shared;

#[cfg(any(test, feature = "benchmarking"))]
pub mod test_utils;

pub use collector::*;
pub use debug_info::*;
pub use report::*;
pub use shared::configuration::*;
pub use shared::constants::*;
pub use shared::log::*;
