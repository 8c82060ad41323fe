// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::exception::{ExceptionInfo, NativeFrame};
use crate::shared::log::{DiagnosticLog, LogLevel};
use std::iter::{Enumerate, FusedIterator};
use std::slice::Iter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub ip: u64,
    /// None when the frame's image is unknown; such frames are recorded without a binary.
    pub image_base: Option<u64>,
}

/// Only the innermost frame decides whether native data can be collected for the exception.
pub fn has_native_image(exception: &dyn ExceptionInfo) -> bool {
    exception
        .native_frames()
        .first()
        .is_some_and(|frame| frame.has_native_image)
}

/// Walks the snapshotted frames of an exception, innermost first.
///
/// Frames without an instruction pointer carry nothing to symbolicate and are skipped.
pub struct FrameExtractor<'a> {
    frames: Enumerate<Iter<'a, NativeFrame>>,
    log: &'a dyn DiagnosticLog,
}

impl<'a> FrameExtractor<'a> {
    pub fn new(exception: &'a dyn ExceptionInfo, log: &'a dyn DiagnosticLog) -> Self {
        Self {
            frames: exception.native_frames().iter().enumerate(),
            log,
        }
    }
}

impl Iterator for FrameExtractor<'_> {
    type Item = FrameDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, frame) in self.frames.by_ref() {
            let Some(ip) = frame.ip else {
                self.log.log(
                    LogLevel::Debug,
                    &format!("Skipping frame {index}: no instruction pointer"),
                );
                continue;
            };
            let image_base = frame.image_base.filter(|base| *base != 0);
            return Some(FrameDescriptor { ip, image_base });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.frames.size_hint().1)
    }
}

impl FusedIterator for FrameExtractor<'_> {}
