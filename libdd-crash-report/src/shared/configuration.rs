// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::constants::DEFAULT_MAX_FRAMES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReportConfiguration {
    // When false, frames are recorded but no image is parsed for debug info
    collect_binaries: bool,
    // Trailing text of the raw trace added by the embedder's own rethrow wrapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    internal_frames_suffix: Option<String>,
    max_frames: usize,
}

impl CrashReportConfiguration {
    pub fn new(
        collect_binaries: bool,
        internal_frames_suffix: Option<String>,
        max_frames: Option<usize>,
    ) -> anyhow::Result<Self> {
        if let Some(suffix) = &internal_frames_suffix {
            anyhow::ensure!(
                !suffix.trim().is_empty(),
                "The internal frames suffix must contain non-whitespace characters"
            );
        }
        let max_frames = max_frames.unwrap_or(DEFAULT_MAX_FRAMES);
        anyhow::ensure!(max_frames > 0, "max_frames must be greater than zero");

        Ok(Self {
            collect_binaries,
            internal_frames_suffix,
            max_frames,
        })
    }

    pub fn collect_binaries(&self) -> bool {
        self.collect_binaries
    }

    /// None when the raw traces handed to the collector carry no wrapper frames.
    pub fn internal_frames_suffix(&self) -> Option<&str> {
        self.internal_frames_suffix.as_deref()
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn set_collect_binaries(&mut self, collect_binaries: bool) {
        self.collect_binaries = collect_binaries;
    }
}

impl Default for CrashReportConfiguration {
    fn default() -> Self {
        Self {
            collect_binaries: true,
            internal_frames_suffix: None,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}
