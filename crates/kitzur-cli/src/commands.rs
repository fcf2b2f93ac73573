use crate::cli::{Commands, Kitzur};
use crate::utils::{format_entry, print_groups};
use chrono::Utc;
use kitzur_core::config::{ensure_config_dir, get_config_file_path};
use kitzur_core::{
    AddShortcutRequest, EngineConfig, FileBackend, KitzurError, Result, Session, ShortcutEntry,
    ShortcutManager, TextBlockSession,
};
use kitzur_server::{check_api_server_health, start_api_server};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One line of a seed file
#[derive(Deserialize, Debug)]
pub struct SeedEntry {
    pub shortcut: String,
    pub expansion: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SeedEntry {
    fn into_pair(self) -> (String, ShortcutEntry) {
        let mut entry = ShortcutEntry::system(self.expansion);
        entry.category = self.category;
        entry.description = self.description;
        (self.shortcut, entry)
    }
}

/// Parse a JSON array of seed entries
pub fn parse_seed_file(path: &Path) -> Result<Vec<(String, ShortcutEntry)>> {
    let content = fs::read_to_string(path)?;
    let entries: Vec<SeedEntry> = serde_json::from_str(&content)?;
    Ok(entries.into_iter().map(SeedEntry::into_pair).collect())
}

fn database_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => Ok(ensure_config_dir()?.join(kitzur_core::config::DB_FILENAME)),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Resolve credentials: explicit user + token, or a token alone looked up in the database
fn session(
    backend: &FileBackend,
    user: Option<String>,
    token: Option<String>,
) -> Result<Option<Session>> {
    match (user, token) {
        (Some(user), Some(token)) => Ok(Some(Session::new(user, token))),
        (None, Some(token)) => backend.session_for_token(&token).map(Some),
        (Some(_), None) => Err(KitzurError::Unauthorized),
        (None, None) => Ok(None),
    }
}

/// Manager loaded with the user's shortcuts, or the public set without credentials
async fn load_manager(
    backend: FileBackend,
    config: EngineConfig,
    session: Option<Session>,
) -> Result<ShortcutManager<FileBackend>> {
    let mut manager = ShortcutManager::new(backend, config);
    match session {
        Some(session) => manager.initialize(session).await?,
        None => manager.load_public().await?,
    }
    Ok(manager)
}

pub fn handle_command(cli: Kitzur) -> Result<()> {
    let db_path = database_path(cli.database)?;
    let config = EngineConfig::load(&get_config_file_path())?;
    let backend = FileBackend::new(&db_path);
    let session = session(&backend, cli.user, cli.token)?;

    let command = cli.commands.unwrap_or(Commands::List {
        category: None,
        personal: false,
    });

    match command {
        Commands::Seed { file } => {
            let count = backend.seed_system(parse_seed_file(&file)?)?;
            println!("Seeded {} system shortcuts", count);
            Ok(())
        }
        Commands::Register { id, token } => {
            backend.ensure_user(&id, &token)?;
            println!("User '{}' registered", id);
            Ok(())
        }
        Commands::Serve { port } => handle_serve_command(port, db_path),
        Commands::ApiStatus => {
            let port = check_api_server_health()?;
            println!("kitzur API server is running on port {}", port);
            Ok(())
        }
        command => runtime()?.block_on(async move {
            let manager = load_manager(backend, config, session).await?;
            handle_manager_command(manager, command).await
        }),
    }
}

async fn handle_manager_command(
    mut manager: ShortcutManager<FileBackend>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Add {
            shortcut,
            expansion,
            description,
            override_system,
        } => {
            manager
                .add_personal(AddShortcutRequest {
                    shortcut,
                    expansion,
                    description,
                    allow_override: override_system,
                })
                .await?;
            let quota = manager.quota();
            println!(
                "Shortcut added successfully ({} of {} personal shortcuts used)",
                quota.used, quota.max
            );
            Ok(())
        }
        Commands::Delete { shortcut } => {
            manager.delete_personal_shortcut(&shortcut).await?;
            println!("Shortcut deleted successfully");
            Ok(())
        }
        Commands::Update {
            shortcut,
            new_shortcut,
            expansion,
            description,
        } => {
            let new_shortcut = new_shortcut.unwrap_or_else(|| shortcut.clone());
            manager
                .update_personal_shortcut(
                    &shortcut,
                    &new_shortcut,
                    &expansion,
                    description.as_deref(),
                )
                .await?;
            println!("Shortcut updated successfully");
            Ok(())
        }
        Commands::List { category, personal } => {
            let groups: Vec<(String, Vec<(String, ShortcutEntry)>)> = if personal {
                vec![(
                    "personal".to_string(),
                    manager.personal_shortcuts().into_iter().collect(),
                )]
            } else {
                manager.shortcuts_by_category()
            };
            let groups: Vec<_> = groups
                .into_iter()
                .filter(|(name, entries)| {
                    !entries.is_empty() && category.as_ref().map_or(true, |c| c == name)
                })
                .collect();
            print_groups(&groups);
            Ok(())
        }
        Commands::Search { query } => {
            let results = manager.search(&query);
            if results.is_empty() {
                println!("No shortcuts match '{}'", query);
            }
            for (shortcut, entry) in &results {
                println!("{}", format_entry(shortcut, entry));
            }
            Ok(())
        }
        Commands::Expand { text, no_numbers } => {
            let mut config = manager.config().clone();
            if no_numbers {
                config.convert_numbers = false;
            }
            println!("{}", type_through(&mut manager, &config, &text));
            Ok(())
        }
        Commands::Stats { warm } => {
            manager.warm_up(&warm);
            let stats = manager.cache_stats();
            let quota = manager.quota();
            println!("Shortcuts loaded: {}", manager.store().len());
            println!("Cache size:       {} / {}", stats.size, stats.max_size);
            println!(
                "Cache hit rate:   {:.1}% ({} hits, {} misses)",
                stats.hit_rate * 100.0,
                stats.hits,
                stats.misses
            );
            if manager.session().is_some() {
                println!("Personal quota:   {} / {}", quota.used, quota.max);
            }
            Ok(())
        }
        Commands::Seed { .. }
        | Commands::Register { .. }
        | Commands::Serve { .. }
        | Commands::ApiStatus => Err(KitzurError::Other(
            "command does not use a loaded shortcut set".to_string(),
        )),
    }
}

/// Feed `text` one character at a time through a text-block session, the way
/// an editor would as the user types, and return the final block text
pub fn type_through(
    manager: &mut ShortcutManager<FileBackend>,
    config: &EngineConfig,
    text: &str,
) -> String {
    let mut block = TextBlockSession::new(config);
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        let cursor = current.chars().count();
        let outcome = block.handle_input(manager, &current, cursor, Utc::now());
        current = outcome.text;
    }
    current
}

fn handle_serve_command(port: u16, db_path: PathBuf) -> Result<()> {
    runtime()?.block_on(async {
        log::info!("Starting kitzur API server on port {}...", port);
        start_api_server(port, db_path).await
    })
}
