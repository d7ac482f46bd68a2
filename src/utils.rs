// src/utils.rs
use chrono::{DateTime, Utc};

/// Escape text for inclusion in HTML text or attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Filename with a millisecond timestamp suffix, e.g. `lettre-1760860800000.html`
pub fn timestamped_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", prefix, at.timestamp_millis(), extension)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Normalize a skill category the way callers type it: trimmed, lowercase
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("é à ç"), "é à ç");
    }

    #[test]
    fn test_timestamped_filename() {
        let at = Utc.timestamp_millis_opt(1_760_860_800_123).unwrap();
        assert_eq!(
            timestamped_filename("lettre-de-motivation", "html", at),
            "lettre-de-motivation-1760860800123.html"
        );
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  Bonjour   le\nmonde "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("  Technique "), "technique");
    }
}
