//! Compound-number transformer.
//!
//! Runs on every word boundary of a text block. A completed number word (or
//! numeral) becomes a [`PendingCompound`]; if the very next completed word is a
//! trigger (`ואחד`, `אחוז`, `אלף`, `מאה`), the two are merged into one token.
//! When no pending state covers a trigger, the preceding word is re-scanned
//! instead. Pending state always wins over the re-scan, so a pair is merged once.

use crate::numbers::{
    bare_numeral_value, classify_trigger, format_thousands, is_bare_numeral, spelled_value,
    split_prefixed_numeral, transform_number_word, Trigger,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCompound {
    pub original_word: String,
    pub transformed_value: String,
    /// Character index where `transformed_value` starts in the block text
    pub position: usize,
    pub had_prefix: bool,
    pub prefix: Option<String>,
    pub separator: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    /// A spelled tens word was rewritten as digits
    NumberRule,
    /// Pending number merged with the trigger word
    Merge,
    /// Previous word re-scanned and merged with the trigger word
    BackwardMerge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundEdit {
    pub text: String,
    pub cursor: usize,
    pub kind: CompoundKind,
    pub replaced: String,
    pub replacement: String,
}

/// The word completed by the boundary character just before `cursor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub word: String,
}

/// Find the word that ends right before the boundary character at `cursor - 1`
pub fn completed_word(chars: &[char], cursor: usize) -> Option<WordSpan> {
    if cursor == 0 || cursor > chars.len() {
        return None;
    }
    let end = cursor - 1;
    let start = chars[..end]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |i| i + 1);
    if start == end {
        return None;
    }
    Some(WordSpan {
        start,
        end,
        word: chars[start..end].iter().collect(),
    })
}

fn is_inline_space(c: &char) -> bool {
    c.is_whitespace() && *c != '\n' && *c != '\r'
}

/// Number a trigger word merges into
#[derive(Debug, Clone)]
struct Base {
    position: usize,
    original: String,
    value: u64,
    prefix: Option<(String, String)>,
    spelled: bool,
}

impl Base {
    fn parse(token: &str, position: usize, original: &str) -> Option<Self> {
        if let Some(value) = bare_numeral_value(token) {
            return Some(Base {
                position,
                original: original.to_string(),
                value,
                prefix: None,
                spelled: false,
            });
        }
        if let Some(numeral) = split_prefixed_numeral(token) {
            return Some(Base {
                position,
                original: original.to_string(),
                value: numeral.value,
                prefix: Some((numeral.prefix, numeral.separator)),
                spelled: false,
            });
        }
        spelled_value(token).map(|value| Base {
            position,
            original: original.to_string(),
            value,
            prefix: None,
            spelled: true,
        })
    }

    fn render(&self, digits: String) -> String {
        match &self.prefix {
            Some((prefix, separator)) => format!("{}{}{}", prefix, separator, digits),
            None => digits,
        }
    }

    /// Combined token, or `None` when this trigger cannot apply to the base
    /// or the result does not fit in a `u64`
    fn merge(&self, trigger: Trigger) -> Option<String> {
        match trigger {
            Trigger::Unit(unit) if !self.spelled => {
                let sum = self.value.checked_add(unit)?;
                Some(self.render(sum.to_string()))
            }
            Trigger::Percent if !self.spelled => Some(self.render(format!("{}%", self.value))),
            Trigger::Thousand => {
                let product = self.value.checked_mul(1000)?;
                Some(self.render(format_thousands(product)))
            }
            Trigger::Hundred => {
                let digits = match self.value {
                    1 => "100".to_string(),
                    2 => "200".to_string(),
                    n => format_thousands(n.checked_mul(100)?),
                };
                Some(self.render(digits))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompoundTransformer {
    pending: Option<PendingCompound>,
    convert_numbers: bool,
}

impl CompoundTransformer {
    pub fn new(convert_numbers: bool) -> Self {
        Self {
            pending: None,
            convert_numbers,
        }
    }

    pub fn pending(&self) -> Option<&PendingCompound> {
        self.pending.as_ref()
    }

    /// Drop pending state, e.g. when the block loses focus
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Handle a word boundary typed at `cursor - 1`. Returns the edit to apply,
    /// or `None` when this boundary is left to other handlers.
    pub fn on_boundary(&mut self, text: &str, cursor: usize) -> Option<CompoundEdit> {
        let chars: Vec<char> = text.chars().collect();
        let pending = self.pending.take();
        let span = completed_word(&chars, cursor)?;

        if let Some(trigger) = classify_trigger(&span.word) {
            return self.merge_trigger(&chars, cursor, &span, trigger, pending);
        }

        self.start_pending(&chars, cursor, &span)
    }

    fn merge_trigger(
        &mut self,
        chars: &[char],
        cursor: usize,
        span: &WordSpan,
        trigger: Trigger,
        pending: Option<PendingCompound>,
    ) -> Option<CompoundEdit> {
        let forward = pending
            .filter(|p| pending_is_intact(chars, p, span.start))
            .and_then(|p| Base::parse(&p.transformed_value, p.position, &p.original_word));

        let (base, kind) = match forward {
            Some(base) => (base, CompoundKind::Merge),
            None => (previous_numeral(chars, span.start)?, CompoundKind::BackwardMerge),
        };

        let Some(replacement) = base.merge(trigger) else {
            log::debug!("Trigger '{}' does not apply to '{}'", span.word, base.original);
            return None;
        };

        let edit = splice(chars, cursor, base.position, span.end, replacement, kind);

        if matches!(trigger, Trigger::Unit(_)) && is_bare_numeral(&edit.replacement) {
            self.pending = Some(PendingCompound {
                original_word: format!("{} {}", base.original, span.word),
                transformed_value: edit.replacement.clone(),
                position: base.position,
                had_prefix: false,
                prefix: None,
                separator: None,
            });
        }

        log::debug!(
            "Compound merge '{}' -> '{}'",
            edit.replaced,
            edit.replacement
        );
        Some(edit)
    }

    fn start_pending(
        &mut self,
        chars: &[char],
        cursor: usize,
        span: &WordSpan,
    ) -> Option<CompoundEdit> {
        let transformed = if self.convert_numbers {
            transform_number_word(&span.word)
        } else {
            None
        };

        let value = transformed.clone().unwrap_or_else(|| span.word.clone());
        let numeric = is_bare_numeral(&value) || split_prefixed_numeral(&value).is_some();
        if !numeric && spelled_value(&value).is_none() {
            return None;
        }

        let prefixed = split_prefixed_numeral(&value);
        self.pending = Some(PendingCompound {
            original_word: span.word.clone(),
            transformed_value: value,
            position: span.start,
            had_prefix: prefixed.is_some(),
            prefix: prefixed.as_ref().map(|p| p.prefix.clone()),
            separator: prefixed.map(|p| p.separator),
        });

        transformed.map(|replacement| {
            splice(
                chars,
                cursor,
                span.start,
                span.end,
                replacement,
                CompoundKind::NumberRule,
            )
        })
    }
}

/// The pending token is still where it was recorded and only inline spaces
/// separate it from the word at `word_start`
fn pending_is_intact(chars: &[char], pending: &PendingCompound, word_start: usize) -> bool {
    let value: Vec<char> = pending.transformed_value.chars().collect();
    let value_end = pending.position + value.len();
    if value_end >= word_start || chars.get(pending.position..value_end) != Some(&value[..]) {
        return false;
    }
    chars[value_end..word_start].iter().all(is_inline_space)
}

/// Re-scan the word before `word_start` for a bare or prefixed numeral
fn previous_numeral(chars: &[char], word_start: usize) -> Option<Base> {
    let gap_start = chars[..word_start]
        .iter()
        .rposition(|c| !is_inline_space(c))
        .map(|i| i + 1)?;
    if gap_start == word_start {
        return None;
    }
    let start = chars[..gap_start]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |i| i + 1);
    let token: String = chars[start..gap_start].iter().collect();

    if is_bare_numeral(&token) || split_prefixed_numeral(&token).is_some() {
        Base::parse(&token, start, &token)
    } else {
        None
    }
}

fn splice(
    chars: &[char],
    cursor: usize,
    start: usize,
    end: usize,
    replacement: String,
    kind: CompoundKind,
) -> CompoundEdit {
    let head: String = chars[..start].iter().collect();
    let tail: String = chars[end..].iter().collect();
    let replaced: String = chars[start..end].iter().collect();
    let replacement_len = replacement.chars().count();

    CompoundEdit {
        text: format!("{}{}{}", head, replacement, tail),
        cursor: start + replacement_len + (cursor - end),
        kind,
        replaced,
        replacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Type `word` plus a trailing space at the end of `text`
    fn type_word(t: &mut CompoundTransformer, text: &mut String, word: &str) -> Option<CompoundEdit> {
        text.push_str(word);
        text.push(' ');
        let cursor = text.chars().count();
        let edit = t.on_boundary(text, cursor);
        if let Some(edit) = &edit {
            *text = edit.text.clone();
        }
        edit
    }

    #[test]
    fn tens_word_is_converted_and_becomes_pending() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        let edit = type_word(&mut t, &mut text, "חמישים").unwrap();

        assert_eq!(edit.kind, CompoundKind::NumberRule);
        assert_eq!(text, "50 ");
        assert_eq!(edit.cursor, 3);
        let pending = t.pending().unwrap();
        assert_eq!(pending.original_word, "חמישים");
        assert_eq!(pending.transformed_value, "50");
        assert!(!pending.had_prefix);
    }

    #[test]
    fn unit_then_percent_chain() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::from("עלה ב ");
        type_word(&mut t, &mut text, "חמישים");
        let merged = type_word(&mut t, &mut text, "ואחד").unwrap();
        assert_eq!(merged.kind, CompoundKind::Merge);
        assert_eq!(text, "עלה ב 51 ");
        assert_eq!(t.pending().unwrap().transformed_value, "51");

        type_word(&mut t, &mut text, "אחוז").unwrap();
        assert_eq!(text, "עלה ב 51% ");
        assert!(t.pending().is_none());
    }

    #[test]
    fn unit_merge_is_arithmetic() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        assert!(type_word(&mut t, &mut text, "5").is_none());
        type_word(&mut t, &mut text, "ושלושה").unwrap();
        assert_eq!(text, "8 ");
    }

    #[test]
    fn prefixed_number_keeps_prefix() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "בחמישים");
        assert_eq!(text, "ב-50 ");
        let pending = t.pending().unwrap();
        assert!(pending.had_prefix);
        assert_eq!(pending.prefix.as_deref(), Some("ב"));
        assert_eq!(pending.separator.as_deref(), Some("-"));

        type_word(&mut t, &mut text, "אלף");
        assert_eq!(text, "ב-50,000 ");
    }

    #[test]
    fn spelled_unit_with_thousand_uses_lookup() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        assert!(type_word(&mut t, &mut text, "חמשת").is_none());
        type_word(&mut t, &mut text, "אלפים").unwrap();
        assert_eq!(text, "5,000 ");
    }

    #[test]
    fn hundred_trigger() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "שלוש");
        type_word(&mut t, &mut text, "מאות");
        assert_eq!(text, "300 ");

        let mut text = String::new();
        type_word(&mut t, &mut text, "שתי");
        type_word(&mut t, &mut text, "מאות");
        assert_eq!(text, "200 ");
    }

    #[test]
    fn non_trigger_discards_pending() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "חמישים");
        assert!(type_word(&mut t, &mut text, "אנשים").is_none());
        assert!(t.pending().is_none());
        assert!(type_word(&mut t, &mut text, "ואחד").is_none());
        assert_eq!(text, "50 אנשים ואחד ");
    }

    #[test]
    fn backward_check_finds_untracked_numeral() {
        let mut t = CompoundTransformer::new(true);
        let text = "המחיר 40 אחוז ";
        let edit = t.on_boundary(text, text.chars().count()).unwrap();
        assert_eq!(edit.kind, CompoundKind::BackwardMerge);
        assert_eq!(edit.text, "המחיר 40% ");
        assert_eq!(edit.cursor, "המחיר 40% ".chars().count());
    }

    #[test]
    fn stale_pending_falls_back_to_backward_check() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "חמישים");
        // The pending numeral was edited out of band
        let text = "60 אחוז ";
        let edit = t.on_boundary(text, text.chars().count()).unwrap();
        assert_eq!(edit.kind, CompoundKind::BackwardMerge);
        assert_eq!(edit.text, "60% ");
    }

    #[test]
    fn percent_does_not_apply_to_spelled_units() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "חמישה");
        assert!(type_word(&mut t, &mut text, "אחוז").is_none());
        assert_eq!(text, "חמישה אחוז ");
    }

    #[test]
    fn conversion_can_be_disabled() {
        let mut t = CompoundTransformer::new(false);
        let mut text = String::new();
        assert!(type_word(&mut t, &mut text, "חמישים").is_none());
        assert_eq!(text, "חמישים ");
        assert_eq!(t.pending().unwrap().transformed_value, "חמישים");
    }

    #[test]
    fn oversized_numerals_are_left_alone() {
        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "99999999999999999");
        assert!(type_word(&mut t, &mut text, "אלף").is_none());
        assert_eq!(text, "99999999999999999 אלף ");

        let mut t = CompoundTransformer::new(true);
        let mut text = String::new();
        type_word(&mut t, &mut text, "18446744073709551615");
        assert!(type_word(&mut t, &mut text, "ואחד").is_none());
        assert_eq!(text, "18446744073709551615 ואחד ");

        // Backward re-scan over the same overflow
        let mut t = CompoundTransformer::new(true);
        let text = "ב-999999999999999999 מאות ";
        assert!(t.on_boundary(text, text.chars().count()).is_none());
    }

    #[test]
    fn completed_word_spans() {
        let chars: Vec<char> = "שלום עולם,".chars().collect();
        let span = completed_word(&chars, chars.len()).unwrap();
        assert_eq!(span.word, "עולם");
        assert_eq!((span.start, span.end), (5, 9));

        let chars: Vec<char> = "שלום  ".chars().collect();
        assert!(completed_word(&chars, chars.len()).is_none());
    }
}
