// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod exception;
mod exception_collector;
mod frames;
mod panic_hook;
mod registry;
mod threading;

pub use exception::*;
pub use exception_collector::{DescriptionCallback, ExceptionCollector};
pub use frames::*;
pub use panic_hook::*;
pub use registry::*;
pub use threading::current_thread_id;
