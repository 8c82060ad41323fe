// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Upper bound of frames copied into the faulting thread.
pub const DEFAULT_MAX_FRAMES: usize = 512;

/// Type name used when the triggering exception was lost before capture.
pub const PLACEHOLDER_EXCEPTION_TYPE: &str = "UnknownException";

/// Message used when the triggering exception was lost before capture.
pub const PLACEHOLDER_EXCEPTION_MESSAGE: &str = "Exception is null";

/// Exception type recorded for Rust panics caught by the panic hook.
pub const PANIC_EXCEPTION_TYPE: &str = "panic";

pub(crate) const REPORT_SCHEMA_VERSION: &str = "1.0";
