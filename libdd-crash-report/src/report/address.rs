// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Renders an address the way every field of the report does: `0x` followed by 16 lowercase
/// hex digits.
pub fn format_address(address: u64) -> String {
    format!("{address:#018x}")
}

/// Inverse of [`format_address`], also accepting unprefixed or shorter values.
pub fn parse_address(address: &str) -> Option<u64> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
