// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::address::format_address;
use crate::debug_info::{Architecture, DebugRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A loaded image referenced by at least one frame of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Binary {
    pub architecture: Architecture,
    /// Exclusive: start address plus the image size.
    pub end_address: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
    pub start_address: String,
}

impl Binary {
    pub fn new(image_base: u64, record: &DebugRecord) -> Self {
        Self {
            architecture: record.architecture,
            end_address: format_address(image_base.saturating_add(u64::from(record.image_size))),
            id: record.identifier(),
            name: binary_name(&record.symbol_path),
            path: record.symbol_path.clone(),
            start_address: format_address(image_base),
        }
    }
}

/// File name of `path` without its extension. Symbol paths are recorded on the build machine,
/// so both separators are honored regardless of the platform we run on.
pub fn binary_name(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _extension)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_binary_name() {
        assert_eq!(binary_name("/tmp/app.pdb"), Some("app".to_string()));
        assert_eq!(binary_name("C:\\build\\Release\\core.lib.pdb"), Some("core.lib".to_string()));
        assert_eq!(binary_name("app"), Some("app".to_string()));
        assert_eq!(binary_name(".hidden"), Some(".hidden".to_string()));
        assert_eq!(binary_name(""), None);
        assert_eq!(binary_name("C:\\symbols\\"), None);
    }

    #[test]
    fn test_binary_from_record() {
        let record = DebugRecord {
            signature: Uuid::from_u128(0xaabb_ccdd_eeff_0011_2233_4455_6677_8899),
            age: 7,
            symbol_path: "/tmp/app.pdb".to_string(),
            image_size: 0x3000,
            architecture: Architecture::Arm64,
        };
        let binary = Binary::new(0x1_0000, &record);

        assert_eq!(binary.start_address, "0x0000000000010000");
        assert_eq!(binary.end_address, "0x0000000000013000");
        assert_eq!(binary.id, "aabbccddeeff001122334455667788997");
        assert_eq!(binary.name.as_deref(), Some("app"));
        assert_eq!(binary.path, "/tmp/app.pdb");
        assert_eq!(binary.architecture, Architecture::Arm64);
    }
}
