//! Formatting and small utilities used across the client.

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::models::UrgencyLevel;

/// Long en-US date with time, e.g. "October 15, 2026, 09:30 AM".
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%B %-d, %Y, %I:%M %p").to_string()
}

/// Parse an RFC 3339 timestamp and format it; "Invalid date" when unparseable.
pub fn format_date_str(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }
    match DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => format_date(&parsed),
        Err(_) => "Invalid date".to_string(),
    }
}

/// Report timestamp in a fixed offset, e.g. "15 October 2026, 09:30 IST".
pub fn format_report_date(date: &DateTime<Utc>, offset: FixedOffset, zone_label: &str) -> String {
    format!(
        "{} {}",
        date.with_timezone(&offset).format("%d %B %Y, %H:%M"),
        zone_label
    )
}

/// Human relative time ("Just now", "3 hours ago", ...).
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();

    let (value, unit) = match seconds {
        s if s < 60 => return "Just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 604_800 => (s / 86_400, "day"),
        s if s < 2_592_000 => (s / 604_800, "week"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };

    format!("{} {}{} ago", value, unit, if value > 1 { "s" } else { "" })
}

/// Truncate to `max_len` characters, appending "..." when cut.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len).collect();
    format!("{}...", cut)
}

/// Human-readable byte size (1024 base), e.g. "1.5 MB".
pub fn format_file_size(bytes: u64, decimals: usize) -> String {
    const SIZES: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let k = 1024f64;
    let i = ((bytes as f64).ln() / k.ln()).floor() as usize;
    let i = i.min(SIZES.len() - 1);
    let value = bytes as f64 / k.powi(i as i32);

    // Match parseFloat(x.toFixed(d)): fixed decimals, trailing zeros dropped
    let fixed = format!("{:.*}", decimals, value);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    };

    format!("{} {}", trimmed, SIZES[i])
}

/// Extension after the last dot, or empty (dotfiles have no extension).
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &file_name[idx + 1..],
    }
}

/// Descriptive severity for a 1-10 rating.
pub fn severity_text(severity: &str) -> &'static str {
    match severity.trim().parse::<i64>() {
        Err(_) => "Unknown",
        Ok(level) if level <= 3 => "Mild",
        Ok(level) if level <= 6 => "Moderate",
        Ok(level) if level <= 8 => "Severe",
        Ok(_) => "Very Severe",
    }
}

/// Display color for an urgency level.
pub fn urgency_color(urgency: Option<UrgencyLevel>) -> &'static str {
    match urgency {
        Some(UrgencyLevel::High) => "#d32f2f",
        Some(UrgencyLevel::Medium) => "#f57c00",
        Some(UrgencyLevel::Low) => "#388e3c",
        None => "#757575",
    }
}

/// Capitalize the first letter of each space-separated word, lower-case the rest.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fresh opaque identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Holds back a stream of values until it has been quiet for `wait`.
///
/// Time is passed in so callers (and tests) control the clock.
#[derive(Debug)]
pub struct Debouncer<T> {
    wait: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Release the pending value if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.duration_since(*at) >= self.wait => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
