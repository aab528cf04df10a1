//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use chrono::{DateTime, Utc};

/// Format a timestamp as a short date, e.g. `7 Aug 2026`.
///
/// Usage in templates: `{{ member.created_at|short_date }}`
#[askama::filter_fn]
pub fn short_date(value: &DateTime<Utc>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.format("%-d %b %Y").to_string())
}

/// Format a timestamp with time of day, e.g. `7 Aug 2026 14:05`.
///
/// Usage in templates: `{{ txn.created_at|date_time }}`
#[askama::filter_fn]
pub fn date_time(value: &DateTime<Utc>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.format("%-d %b %Y %H:%M").to_string())
}
