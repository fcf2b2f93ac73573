//! Pure pattern helpers for Hebrew number words.
//!
//! Everything here is a stateless function over a single token; the compound
//! transformer in [`crate::compound`] strings them together.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inflectional prefixes that may attach to a spelled number
const NUMBER_PREFIXES: &str = "ובהלמכש";

static TENS: &[(&str, u64)] = &[
    ("עשרים", 20),
    ("שלושים", 30),
    ("ארבעים", 40),
    ("חמישים", 50),
    ("שישים", 60),
    ("שבעים", 70),
    ("שמונים", 80),
    ("תשעים", 90),
];

static UNITS: &[(&str, u64)] = &[
    ("אחד", 1),
    ("אחת", 1),
    ("שניים", 2),
    ("שנים", 2),
    ("שתיים", 2),
    ("שתים", 2),
    ("שני", 2),
    ("שתי", 2),
    ("שלושה", 3),
    ("שלוש", 3),
    ("שלושת", 3),
    ("ארבעה", 4),
    ("ארבע", 4),
    ("ארבעת", 4),
    ("חמישה", 5),
    ("חמש", 5),
    ("חמשת", 5),
    ("שישה", 6),
    ("שש", 6),
    ("ששת", 6),
    ("שבעה", 7),
    ("שבע", 7),
    ("שבעת", 7),
    ("שמונה", 8),
    ("שמונת", 8),
    ("תשעה", 9),
    ("תשע", 9),
    ("תשעת", 9),
    ("עשרה", 10),
    ("עשר", 10),
    ("עשרת", 10),
];

const PERCENT_TRIGGERS: &[&str] = &["אחוז", "אחוזים"];
const THOUSAND_TRIGGERS: &[&str] = &["אלף", "אלפים"];
const HUNDRED_TRIGGERS: &[&str] = &["מאה", "מאות"];

static BARE_NUMERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

static PREFIXED_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([א-ת]+)([-־])?([0-9]+)$").unwrap());

/// A numeral carrying a Hebrew inflectional prefix, e.g. `ב-50`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedNumeral {
    pub prefix: String,
    pub separator: String,
    pub value: u64,
}

impl PrefixedNumeral {
    pub fn render(&self, digits: &str) -> String {
        format!("{}{}{}", self.prefix, self.separator, digits)
    }
}

/// Which merge a trigger word asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `ו` + unit word, adds the unit
    Unit(u64),
    Percent,
    Thousand,
    Hundred,
}

pub fn tens_value(word: &str) -> Option<u64> {
    TENS.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

pub fn unit_value(word: &str) -> Option<u64> {
    UNITS.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

/// Value of a spelled tens or unit word
pub fn spelled_value(word: &str) -> Option<u64> {
    tens_value(word).or_else(|| unit_value(word))
}

/// `ואחד` -> 1, `ושלושה` -> 3
pub fn unit_combiner_value(word: &str) -> Option<u64> {
    word.strip_prefix('ו').and_then(unit_value)
}

pub fn is_bare_numeral(token: &str) -> bool {
    BARE_NUMERAL.is_match(token)
}

pub fn bare_numeral_value(token: &str) -> Option<u64> {
    if is_bare_numeral(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// Split `ב-50` into prefix `ב`, separator `-`, value 50. A missing separator
/// defaults to `-`.
pub fn split_prefixed_numeral(token: &str) -> Option<PrefixedNumeral> {
    let caps = PREFIXED_NUMERAL.captures(token)?;
    Some(PrefixedNumeral {
        prefix: caps[1].to_string(),
        separator: caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "-".to_string()),
        value: caps[3].parse().ok()?,
    })
}

pub fn classify_trigger(word: &str) -> Option<Trigger> {
    if let Some(unit) = unit_combiner_value(word) {
        return Some(Trigger::Unit(unit));
    }
    if PERCENT_TRIGGERS.contains(&word) {
        return Some(Trigger::Percent);
    }
    if THOUSAND_TRIGGERS.contains(&word) {
        return Some(Trigger::Thousand);
    }
    if HUNDRED_TRIGGERS.contains(&word) {
        return Some(Trigger::Hundred);
    }
    None
}

/// Rule transform for a completed word: spelled tens become digits, keeping an
/// attached one-letter prefix as `prefix-digits`.
///
/// `חמישים` -> `50`, `בחמישים` -> `ב-50`. Units are left spelled out.
pub fn transform_number_word(word: &str) -> Option<String> {
    if let Some(value) = tens_value(word) {
        return Some(value.to_string());
    }
    let mut chars = word.chars();
    let first = chars.next()?;
    if NUMBER_PREFIXES.contains(first) {
        if let Some(value) = tens_value(chars.as_str()) {
            return Some(format!("{}-{}", first, value));
        }
    }
    None
}

/// `50000` -> `50,000`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelled_values() {
        assert_eq!(tens_value("חמישים"), Some(50));
        assert_eq!(unit_value("שלושה"), Some(3));
        assert_eq!(unit_value("אחת"), Some(1));
        assert_eq!(spelled_value("עשר"), Some(10));
        assert_eq!(spelled_value("שלום"), None);
    }

    #[test]
    fn unit_combiners_need_vav() {
        assert_eq!(unit_combiner_value("ואחד"), Some(1));
        assert_eq!(unit_combiner_value("ושלושה"), Some(3));
        assert_eq!(unit_combiner_value("אחד"), None);
        assert_eq!(unit_combiner_value("ושלום"), None);
    }

    #[test]
    fn prefixed_numerals() {
        let parsed = split_prefixed_numeral("ב-50").unwrap();
        assert_eq!(parsed.prefix, "ב");
        assert_eq!(parsed.separator, "-");
        assert_eq!(parsed.value, 50);

        let bare = split_prefixed_numeral("ל50").unwrap();
        assert_eq!(bare.separator, "-");
        assert_eq!(bare.render("51"), "ל-51");

        assert!(split_prefixed_numeral("50").is_none());
        assert!(split_prefixed_numeral("ב-").is_none());
    }

    #[test]
    fn only_ascii_digits_are_numerals() {
        assert!(is_bare_numeral("50"));
        assert!(!is_bare_numeral("٥٠"));
        assert_eq!(bare_numeral_value("٥٠"), None);
        assert!(split_prefixed_numeral("ב-٥٠").is_none());
    }

    #[test]
    fn triggers() {
        assert_eq!(classify_trigger("ואחד"), Some(Trigger::Unit(1)));
        assert_eq!(classify_trigger("אחוז"), Some(Trigger::Percent));
        assert_eq!(classify_trigger("אלף"), Some(Trigger::Thousand));
        assert_eq!(classify_trigger("מאות"), Some(Trigger::Hundred));
        assert_eq!(classify_trigger("בית"), None);
    }

    #[test]
    fn tens_words_become_digits() {
        assert_eq!(transform_number_word("חמישים").as_deref(), Some("50"));
        assert_eq!(transform_number_word("בחמישים").as_deref(), Some("ב-50"));
        assert_eq!(transform_number_word("חמישה"), None);
        assert_eq!(transform_number_word("שלום"), None);
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(500), "500");
        assert_eq!(format_thousands(5000), "5,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
