//! Price extraction from raw listing text.
//!
//! Listing nodes carry noisy text (title, seller, condition badges) around
//! the price. Three patterns are recognized, in priority order: a
//! yen-symbol-prefixed group (`¥12,345`), a yen-word-suffixed group
//! (`12,345円`), and a string that is entirely digits and thousands
//! separators. Foreign-currency prices (`US$12.34`) never match.

use std::sync::LazyLock;

use regex::Regex;

/// Yen-symbol prefix, half- or full-width: `¥12,345`, `￥ 980`.
static YEN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[¥￥]\s*([0-9][0-9,]*)").unwrap());

/// Yen-word suffix: `12,345円`.
static YEN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]*)\s*円").unwrap());

/// Entire (trimmed) text is digits and separators; fallback for nodes that
/// hold nothing but the price.
static DIGITS_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9][0-9,]*$").unwrap());

/// Extract an integer yen price from listing text.
///
/// Returns `None` when no pattern matches; callers treat that as "try
/// another source", never as price-zero. A parsed zero is rejected for the
/// same reason.
pub fn extract_price(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let group = YEN_PREFIX
        .captures(text)
        .or_else(|| YEN_SUFFIX.captures(text))
        .map(|c| c.get(1).unwrap().as_str())
        .or_else(|| DIGITS_ONLY.find(text).map(|m| m.as_str()))?;

    parse_digits(group)
}

fn parse_digits(group: &str) -> Option<u32> {
    let digits: String = group.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().ok().filter(|&price| price > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yen_symbol_prefix() {
        assert_eq!(extract_price("¥12,345"), Some(12345));
        assert_eq!(extract_price("¥ 980"), Some(980));
        assert_eq!(extract_price("￥3,500"), Some(3500));
        assert_eq!(extract_price("Supreme Box Logo ¥45,000 送料込み"), Some(45000));
    }

    #[test]
    fn test_yen_word_suffix() {
        assert_eq!(extract_price("12,345円"), Some(12345));
        assert_eq!(extract_price("1,200 円"), Some(1200));
    }

    #[test]
    fn test_digits_only_fallback() {
        assert_eq!(extract_price("12,345"), Some(12345));
        assert_eq!(extract_price("  4980  "), Some(4980));
    }

    #[test]
    fn test_foreign_currency_rejected() {
        assert_eq!(extract_price("US$12.34"), None);
        assert_eq!(extract_price("$1,234"), None);
        assert_eq!(extract_price("EUR 99"), None);
    }

    #[test]
    fn test_malformed_text_is_absent() {
        assert_eq!(extract_price(""), None);
        assert_eq!(extract_price("Supreme T-Shirt"), None);
        assert_eq!(extract_price("SOLD OUT"), None);
        assert_eq!(extract_price("1234.56"), None);
    }

    #[test]
    fn test_zero_is_not_a_price() {
        assert_eq!(extract_price("¥0"), None);
    }

    #[test]
    fn test_prefix_wins_over_plain_digits() {
        // The symbol-prefixed group is preferred over other digit runs.
        assert_eq!(extract_price("3 days left ¥2,800"), Some(2800));
    }
}
