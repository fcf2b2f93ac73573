//! Per-block input handling: the word-boundary pipeline an editor calls on
//! every keystroke.
//!
//! For each boundary the compound-number path runs first; if it rewrites the
//! text the shortcut path is skipped, so a span is never transformed twice.

use crate::backend::ShortcutBackend;
use crate::compound::{CompoundKind, CompoundTransformer, PendingCompound};
use crate::config::EngineConfig;
use crate::expansion::is_trailing_punctuation;
use crate::manager::ShortcutManager;
use crate::models::UndoHistoryItem;
use crate::undo::UndoLedger;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Marks that occur inside keys and prefixed numerals (`ב'ס`, `עו"ד`, `ב-50`);
/// typing one never ends a word
const IN_WORD_MARKS: &[char] = &['\'', '׳', '"', '״', '-'];

/// Whether typing `c` completes the word before it
pub fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || (is_trailing_punctuation(c) && !IN_WORD_MARKS.contains(&c))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    Unchanged,
    /// Two number tokens merged into one
    Compound,
    /// A spelled number became digits
    NumberRule,
    Shortcut {
        shortcut: String,
        expanded_to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub text: String,
    pub cursor: usize,
    pub kind: EditKind,
}

impl EditOutcome {
    fn unchanged(text: &str, cursor: usize) -> Self {
        Self {
            text: text.to_string(),
            cursor,
            kind: EditKind::Unchanged,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.kind != EditKind::Unchanged
    }
}

/// Input state of a single text block
#[derive(Debug)]
pub struct TextBlockSession {
    compound: CompoundTransformer,
    undo: UndoLedger,
    undo_window: Duration,
    convert_numbers: bool,
}

impl TextBlockSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            compound: CompoundTransformer::new(config.convert_numbers),
            undo: UndoLedger::new(config.undo_capacity),
            undo_window: config.undo_window(),
            convert_numbers: config.convert_numbers,
        }
    }

    /// Handle the block's text after an edit, `cursor` in characters.
    pub fn handle_input<B: ShortcutBackend>(
        &mut self,
        manager: &mut ShortcutManager<B>,
        text: &str,
        cursor: usize,
        now: DateTime<Utc>,
    ) -> EditOutcome {
        let cursor = cursor.min(text.chars().count());
        let Some(boundary) = cursor.checked_sub(1).and_then(|i| text.chars().nth(i)) else {
            return EditOutcome::unchanged(text, cursor);
        };
        if !is_word_boundary(boundary) {
            return EditOutcome::unchanged(text, cursor);
        }

        if self.convert_numbers {
            if let Some(edit) = self.compound.on_boundary(text, cursor) {
                let kind = match edit.kind {
                    CompoundKind::NumberRule => EditKind::NumberRule,
                    CompoundKind::Merge | CompoundKind::BackwardMerge => EditKind::Compound,
                };
                return EditOutcome {
                    text: edit.text,
                    cursor: edit.cursor,
                    kind,
                };
            }
        }

        // A space stays after the expansion; punctuation goes through the retry
        let at = if boundary.is_whitespace() {
            cursor - 1
        } else {
            cursor
        };
        let result = manager.process_text(text, at);
        if !result.expanded {
            return EditOutcome::unchanged(text, cursor);
        }

        let shortcut = result.expanded_shortcut.unwrap_or_default();
        self.undo.push(UndoHistoryItem {
            text: text.to_string(),
            cursor_position: cursor,
            is_shortcut_expansion: true,
            timestamp: now,
            expanded_shortcut: Some(shortcut.clone()),
        });

        EditOutcome {
            text: result.text,
            cursor: result.cursor_position + (cursor - at),
            kind: EditKind::Shortcut {
                shortcut,
                expanded_to: result.expanded_to.unwrap_or_default(),
            },
        }
    }

    /// Reverse the last expansion if it happened within the undo window
    pub fn undo(&mut self, now: DateTime<Utc>) -> Option<(String, usize)> {
        self.undo
            .pop_if_recent_at(now, self.undo_window)
            .map(|item| (item.text, item.cursor_position))
    }

    /// Focus left the block
    pub fn blur(&mut self) {
        self.compound.reset();
        self.undo.clear();
    }

    pub fn pending_compound(&self) -> Option<&PendingCompound> {
        self.compound.pending()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}
