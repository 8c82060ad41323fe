// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration, constants and diagnostics shared by the collector and the parser

pub(crate) mod configuration;
pub(crate) mod constants;
pub(crate) mod log;
