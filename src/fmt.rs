//! Shared formatting utilities for size display and console output

use console::Emoji;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static EMOJI_DISABLED: AtomicBool = AtomicBool::new(false);

/// Print every [`Glyph`] as its plain-text fallback from now on
pub fn disable_emoji() {
    EMOJI_DISABLED.store(true, Ordering::Relaxed);
}

/// Console emoji that can be switched off process-wide with [`disable_emoji`].
///
/// While enabled, display defers to [`console::Emoji`], which still falls
/// back on terminals without emoji support.
#[derive(Clone, Copy)]
pub struct Glyph(Emoji<'static, 'static>);

impl Glyph {
    /// Text printed with emoji explicitly allowed or not
    pub fn render(&self, emoji: bool) -> String {
        if emoji {
            self.0.to_string()
        } else {
            self.0 .1.to_string()
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(!EMOJI_DISABLED.load(Ordering::Relaxed)))
    }
}

/// Rocket emoji for launch/start operations
pub const ROCKET: Glyph = Glyph(Emoji("🚀", ">"));

/// Checkmark emoji for success
pub const CHECKMARK: Glyph = Glyph(Emoji("✅", "[OK]"));

/// Crossmark emoji for failure
pub const CROSSMARK: Glyph = Glyph(Emoji("❌", "[FAIL]"));

/// Chart emoji for metrics/statistics
pub const CHART: Glyph = Glyph(Emoji("📊", "~"));

/// Info emoji for informational messages
pub const INFO: Glyph = Glyph(Emoji("ℹ️", "i"));

/// Bytes per kilo-unit in report sizes (decimal, matching bundler output)
const KILO: i64 = 1000;

/// Format a byte count as a short human-readable size.
///
/// Magnitudes of at least one kilobyte are rounded to whole `kB`
/// (halves round toward positive infinity), smaller values stay in `B`.
/// Negative values keep their sign.
///
/// # Examples
///
/// ```
/// use bundle_delta::fmt::human_size;
///
/// assert_eq!(human_size(999), "999B");
/// assert_eq!(human_size(3999), "4kB");
/// assert_eq!(human_size(-1000), "-1kB");
/// ```
pub fn human_size(bytes: i64) -> String {
    if bytes >= KILO || bytes <= -KILO {
        let kilo = (bytes as f64 / KILO as f64 + 0.5).floor() as i64;
        format!("{}kB", kilo)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a size delta, prefixing positive values with `+`.
///
/// ```
/// use bundle_delta::fmt::signed_size;
///
/// assert_eq!(signed_size(3999), "+4kB");
/// assert_eq!(signed_size(-10), "-10B");
/// assert_eq!(signed_size(0), "0B");
/// ```
pub fn signed_size(delta: i64) -> String {
    if delta > 0 {
        format!("+{}", human_size(delta))
    } else {
        human_size(delta)
    }
}

/// Human-readable size of an unsigned byte count
pub fn human_size_u64(bytes: u64) -> String {
    human_size(i64::try_from(bytes).unwrap_or(i64::MAX))
}

/// Truncate string to at most `max_chars` characters, ending with `...`
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_without_emoji_prints_fallback() {
        assert_eq!(CHECKMARK.render(false), "[OK]");
        assert_eq!(CROSSMARK.render(false), "[FAIL]");
        assert_eq!(INFO.render(false), "i");
    }

    #[test]
    fn test_human_size_below_kilo_stays_in_bytes() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(1), "1B");
        assert_eq!(human_size(999), "999B");
        assert_eq!(human_size(-999), "-999B");
    }

    #[test]
    fn test_human_size_at_unit_boundaries() {
        assert_eq!(human_size(1000), "1kB");
        assert_eq!(human_size(1499), "1kB");
        assert_eq!(human_size(1500), "2kB");
        assert_eq!(human_size(2_000_000), "2000kB");
    }

    #[test]
    fn test_human_size_negative_halves_round_up() {
        assert_eq!(human_size(-1500), "-1kB");
        assert_eq!(human_size(-1501), "-2kB");
    }

    #[test]
    fn test_signed_size_only_prefixes_positive() {
        assert_eq!(signed_size(1), "+1B");
        assert_eq!(signed_size(0), "0B");
        assert_eq!(signed_size(-1000), "-1kB");
    }

    #[test]
    fn test_truncate_with_long_string_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a very long string", 10), "this is...");
    }
}
