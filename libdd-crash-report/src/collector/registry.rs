// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

/// Image bases already resolved while building one report.
///
/// A registry must not outlive the report it was created for.
#[derive(Debug, Default)]
pub struct BinaryRegistry {
    seen: HashSet<u64>,
}

impl BinaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, image_base: u64) -> bool {
        self.seen.contains(&image_base)
    }

    pub fn mark_seen(&mut self, image_base: u64) {
        self.seen.insert(image_base);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
