use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Format a large integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// Whole US dollars: 104696.4 → "$104,696"
pub fn fmt_usd(price: f64) -> String {
    let rounded = price.round() as i64;
    if rounded < 0 {
        format!("-${}", fmt_number(-rounded))
    } else {
        format!("${}", fmt_number(rounded))
    }
}

/// Seconds as `HH:MM:SS`.
pub fn fmt_countdown(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Drop markup tags from catalog rich text for plain-terminal output.
/// `<br>` becomes a newline; everything else between `<` and `>` is removed.
pub fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in s.chars() {
        match (in_tag, ch) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag.trim().trim_end_matches('/').trim().to_ascii_lowercase();
                if name == "br" {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }
    out
}

/// A `width`-cell bar filled to `pct` percent.
pub fn bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(-42_000), "-42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn test_fmt_usd_rounds_to_dollars() {
        assert_eq!(fmt_usd(104_696.4), "$104,696");
        assert_eq!(fmt_usd(999.5), "$1,000");
    }

    #[test]
    fn test_fmt_countdown() {
        assert_eq!(fmt_countdown(3600), "01:00:00");
        assert_eq!(fmt_countdown(3599), "00:59:59");
        assert_eq!(fmt_countdown(61), "00:01:01");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("Deals <magicDamage>40 damage</magicDamage>.<br><br />Slows."),
            "Deals 40 damage.\n\nSlows."
        );
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(50.0, 4), "██░░");
        assert_eq!(bar(150.0, 2), "██");
    }
}
