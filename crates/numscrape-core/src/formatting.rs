//! Requester-facing status and caption strings (Telegram HTML).

use crate::domain::Mode;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn started_status(mode: Mode, limit: usize) -> String {
    format!("🤖 Scraping started for <b>{mode}</b> mode.\nChecking last {limit} messages...")
}

pub fn progress_status(mode: Mode, scanned: usize, limit: usize, collected: usize) -> String {
    format!(
        "🤖 Scraping <b>{mode}</b> mode...\n📨 Checked {scanned}/{limit} messages\n🔢 Numbers so far: {collected}"
    )
}

pub fn completed_caption(mode: Mode, count: usize) -> String {
    format!(
        "✅ <b>Scraping Complete</b>\n📂 Mode: {mode}\n🔢 Numbers found: {count}\n🔀 Sequence: Randomized"
    )
}

pub fn empty_status() -> String {
    "❌ No data found matching your criteria.".to_string()
}

pub fn failed_status(reason: &str) -> String {
    format!("❌ Error during scraping: {}", escape_html(reason))
}

/// Truncate to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    format!("{}...", s.chars().take(keep).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn failure_reason_is_escaped() {
        let s = failed_status("chat <x> unreachable");
        assert_eq!(s, "❌ Error during scraping: chat &lt;x&gt; unreachable");
    }

    #[test]
    fn caption_mentions_mode_and_count() {
        let c = completed_caption(Mode::Found, 42);
        assert!(c.contains("Mode: found"));
        assert!(c.contains("Numbers found: 42"));
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ééééééé", 5), "éé...");
    }
}
