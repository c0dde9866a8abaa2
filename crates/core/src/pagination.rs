//! Limit/offset clamping for list endpoints.

/// Default page size for entry listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for entry listings.
pub const MAX_LIMIT: i64 = 100;

/// Clamp a user-provided limit to `1..=max`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
