use kitzur_core::{ShortcutEntry, ShortcutSource};

/// One line per shortcut: `key -> expansion [personal] (description)`
pub fn format_entry(shortcut: &str, entry: &ShortcutEntry) -> String {
    let mut line = format!("{:<12} -> {}", shortcut, entry.expansion);
    if entry.source == ShortcutSource::User {
        line.push_str(" [personal]");
    }
    if let Some(description) = &entry.description {
        line.push_str(&format!(" ({})", description));
    }
    line
}

pub fn print_groups(groups: &[(String, Vec<(String, ShortcutEntry)>)]) {
    if groups.is_empty() {
        println!("No shortcuts found.");
        return;
    }
    for (name, entries) in groups {
        println!("{} ({})", name, entries.len());
        for (shortcut, entry) in entries {
            println!("  {}", format_entry(shortcut, entry));
        }
    }
}
