//! Parsing helpers for CLI values and configuration strings.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses human-readable sizes such as "1GB", "500MB" or "1024KiB" into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	Byte::from_str(s)
		.map(|byte| byte.as_u64())
		.map_err(|e| format!("Invalid size format: '{}'. Error: {}", s, e))
}

/// Trims whitespace and lowercases, for case-insensitive comparisons.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Normalizes a hex string: trimmed, lowercase, without a leading `0x`.
pub fn normalize_hex(input: &str) -> String {
	let trimmed = input.trim();
	let stripped = trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
		.unwrap_or(trimmed);
	stripped.to_ascii_lowercase()
}
