//! Time-span parsing to whole minutes.

use regex::Regex;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("valid iso duration regex")
});

// "PT15-20M" style ranges keep their lower bound.
static ISO_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)-\d+(?:\.\d+)?").expect("valid range regex"));

// One week; anything longer is a data error and is treated as absent.
pub const MAX_MINUTES: u32 = 7 * 24 * 60;

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours|hour|hrs|hr|h)\b").expect("valid hours regex")
});

static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:minutes|minute|mins|min|m)\b").expect("valid minutes regex")
});

/// Parses an ISO-8601 duration such as `PT1H30M` into minutes.
///
/// Returns `None` when no component is present, the total is zero, or it
/// exceeds [`MAX_MINUTES`].
pub fn parse_iso8601(duration: &str) -> Option<u32> {
    let trimmed = duration.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = ISO_RANGE.replace_all(trimmed, "$1");
    let caps = ISO_DURATION.captures(&normalized)?;

    let component = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let minutes =
        component(1) * 24.0 * 60.0 + component(2) * 60.0 + component(3) + component(4) / 60.0;
    let minutes = minutes.round();
    if minutes <= 0.0 || minutes > f64::from(MAX_MINUTES) {
        None
    } else {
        Some(minutes as u32)
    }
}

/// Sums every "N hours" and "N minutes" occurrence in free text.
///
/// Labels such as "Prep time:" must be stripped by the caller. Totals
/// above [`MAX_MINUTES`] are `None`.
pub fn parse_free_text(text: &str) -> Option<u32> {
    let hours: f64 = HOURS
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .sum();
    let minutes: f64 = MINUTES
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .sum();

    let total = (hours * 60.0 + minutes).round();
    if total <= 0.0 || total > f64::from(MAX_MINUTES) {
        None
    } else {
        Some(total as u32)
    }
}

/// Parses whichever format `value` is in.
pub fn parse_any(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.starts_with(['P', 'p']) {
        if let Some(minutes) = parse_iso8601(trimmed) {
            return Some(minutes);
        }
    }
    parse_free_text(trimmed)
}

/// `prep + cook` when at least one of them is present and positive.
pub fn derive_total_time(prep: Option<u32>, cook: Option<u32>) -> Option<u32> {
    let prep = prep.unwrap_or(0);
    let cook = cook.unwrap_or(0);
    if prep > 0 || cook > 0 {
        Some(prep.saturating_add(cook))
    } else {
        None
    }
}
