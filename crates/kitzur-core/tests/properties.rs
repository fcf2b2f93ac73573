use chrono::{Duration, Utc};
use kitzur_core::{
    process_text, AddShortcutRequest, EditKind, EngineConfig, FileBackend, KitzurError,
    ShortcutBackend, ShortcutCache, ShortcutEntry, ShortcutManager, ShortcutSnapshot,
    ShortcutStore, TextBlockSession, UserQuota,
};
use tempfile::TempDir;

fn store(entries: &[(&str, ShortcutEntry)]) -> ShortcutStore {
    ShortcutStore::from_snapshot(ShortcutSnapshot {
        shortcuts: entries
            .iter()
            .map(|(k, e)| (k.to_string(), e.clone()))
            .collect(),
        ..Default::default()
    })
}

fn seeded_backend(dir: &TempDir) -> FileBackend {
    let backend = FileBackend::new(dir.path().join("shortcuts.json"));
    backend
        .seed_system(vec![
            ("א".to_string(), ShortcutEntry::system("X")),
            ("אב".to_string(), ShortcutEntry::system("Y")),
            (
                "פייסבוק".to_string(),
                ShortcutEntry::system("Facebook").with_category("english"),
            ),
        ])
        .unwrap();
    backend
}

#[test]
fn longest_match_wins() {
    let store = store(&[
        ("א", ShortcutEntry::system("X")),
        ("אב", ShortcutEntry::system("Y")),
    ]);
    let result = process_text(&store, &EngineConfig::default(), "אב", 2);
    assert_eq!(result.text, "Y");
}

#[test]
fn prefix_is_reapplied_with_dash_and_comma_kept() {
    let store = store(&[(
        "פייסבוק",
        ShortcutEntry::system("Facebook").with_category("english"),
    )]);
    let result = process_text(&store, &EngineConfig::default(), "ופייסבוק,", 9);
    assert!(result.expanded);
    assert_eq!(result.text, "ו- Facebook,");
}

#[test]
fn non_matches_are_idempotent() {
    let store = store(&[("בס", ShortcutEntry::system("בית ספר"))]);
    let config = EngineConfig::default();
    for (text, cursor) in [("", 0), ("שלום", 4), ("בסיס", 4), ("בס עולם", 7), ("בס,.", 4)] {
        let result = process_text(&store, &config, text, cursor);
        assert!(!result.expanded, "{text}");
        assert_eq!(result.text, text);
        assert_eq!(result.cursor_position, cursor);
    }
}

#[tokio::test]
async fn compound_numbers_merge_arithmetically() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&dir);
    let session = backend.ensure_user("dana", "secret").unwrap();
    let mut manager = ShortcutManager::new(backend, EngineConfig::default());
    manager.initialize(session).await.unwrap();

    let mut block = TextBlockSession::new(manager.config());
    let now = Utc::now();
    let mut text = String::new();
    let mut kinds = Vec::new();
    for word in ["חמישים ", "ואחד ", "אחוז "] {
        text.push_str(word);
        let outcome = block.handle_input(&mut manager, &text, text.chars().count(), now);
        kinds.push(outcome.kind.clone());
        text = outcome.text;
    }
    assert_eq!(text, "51% ");
    assert_eq!(
        kinds,
        vec![EditKind::NumberRule, EditKind::Compound, EditKind::Compound]
    );

    block.blur();
    let mut text = String::from("5 ");
    block.handle_input(&mut manager, &text, 2, now);
    text.push_str("ושלושה ");
    let outcome = block.handle_input(&mut manager, &text, text.chars().count(), now);
    assert_eq!(outcome.text, "8 ");
}

#[tokio::test]
async fn full_quota_rejects_and_leaves_set_unmodified() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&dir);
    let session = backend.ensure_user("dana", "secret").unwrap();

    let mut database = backend.load_database().unwrap();
    let user = database.users.get_mut("dana").unwrap();
    user.quota_max = 100;
    for i in 0..100 {
        user.shortcuts.push(kitzur_core::storage::StoredShortcut {
            shortcut: format!("k{}", i),
            expansion: format!("expansion {}", i),
            description: None,
            category: None,
            override_system: false,
        });
    }
    backend.save_database(&database).unwrap();

    let mut manager = ShortcutManager::new(backend, EngineConfig::default());
    manager.initialize(session.clone()).await.unwrap();
    assert_eq!(manager.quota(), UserQuota::new(100, 100));
    let before = manager.store().len();

    let err = manager
        .add_personal_shortcut("חדש", "קיצור חדש", None)
        .await
        .unwrap_err();
    assert!(matches!(err, KitzurError::QuotaExceeded { max: 100 }));
    assert_eq!(err.code(), "QUOTA_EXCEEDED");
    assert_eq!(manager.store().len(), before);
    assert!(!manager.has_shortcut("חדש"));

    // The backend enforces the same limit on its own
    let request = AddShortcutRequest {
        shortcut: "חדש".to_string(),
        expansion: "קיצור חדש".to_string(),
        description: None,
        allow_override: false,
    };
    assert!(matches!(
        manager.backend().add_personal(&session, &request).await,
        Err(KitzurError::QuotaExceeded { .. })
    ));
}

#[tokio::test]
async fn undo_window_is_exclusive_at_thirty_seconds() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&dir);
    let mut manager = ShortcutManager::new(backend, EngineConfig::default());
    manager.load_public().await.unwrap();

    let mut block = TextBlockSession::new(manager.config());
    let t = Utc::now();
    let expanded = block.handle_input(&mut manager, "אב ", 3, t);
    assert_eq!(expanded.text, "Y ");

    assert!(block.undo(t + Duration::milliseconds(30_001)).is_none());
    assert_eq!(
        block.undo(t + Duration::milliseconds(29_999)),
        Some(("אב ".to_string(), 3))
    );
}

#[test]
fn bulk_load_keeps_trie_and_map_in_step() {
    let keys: Vec<String> = (0..50).map(|i| format!("מ{}", i)).collect();
    let mut cache = ShortcutCache::new(100);
    cache.bulk_load(
        keys.iter()
            .map(|k| (k.clone(), ShortcutEntry::system(format!("ערך {}", k))))
            .collect(),
    );

    for key in &keys {
        assert!(cache.get(key).is_some(), "{key}");
    }
    assert_eq!(cache.find_by_prefix("", 1000).len(), keys.len());
    assert_eq!(cache.find_by_prefix("", 7).len(), 7);
    assert_eq!(cache.find_by_prefix("מ", 1000).len(), keys.len());
}

#[test]
fn eviction_never_exceeds_max_size() {
    let mut cache = ShortcutCache::new(5);
    for i in 0..5 {
        cache.set(&format!("k{}", i), ShortcutEntry::system("v"));
    }
    // k0 becomes the most recent; k1 is now the oldest
    cache.get("k0");

    for i in 5..20 {
        cache.set(&format!("k{}", i), ShortcutEntry::system("v"));
        assert!(cache.len() <= 5);
        if i == 5 {
            assert!(!cache.contains("k1"));
            assert!(cache.contains("k0"));
        }
    }
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.stats().max_size, 5);
}
