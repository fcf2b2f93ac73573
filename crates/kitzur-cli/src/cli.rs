use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "kitzur - Hebrew transcription shortcut expansion",
    long_about = "kitzur expands abbreviations in Hebrew transcription text, combining them with \
                  grammatical prefixes and merging spelled-out compound numbers as you type."
)]
pub struct Kitzur {
    #[clap(long, global = true, env = "KITZUR_USER", help = "User id owning personal shortcuts")]
    pub user: Option<String>,

    #[clap(
        long,
        global = true,
        env = "KITZUR_TOKEN",
        hide_env_values = true,
        help = "Session token for personal shortcuts"
    )]
    pub token: Option<String>,

    #[clap(long, global = true, env = "KITZUR_DB", help = "Path to the shortcut database")]
    pub database: Option<PathBuf>,

    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a personal shortcut
    Add {
        #[clap(long, short = 's', help = "Shortcut key")]
        shortcut: String,

        #[clap(long, short = 'e', help = "Text the shortcut expands to")]
        expansion: String,

        #[clap(long, short = 'd', help = "Optional description")]
        description: Option<String>,

        #[clap(long, help = "Shadow a system shortcut with the same key")]
        override_system: bool,
    },
    /// Delete a personal shortcut
    Delete {
        #[clap(long, short, help = "Shortcut key to delete")]
        shortcut: String,
    },
    /// Replace a personal shortcut
    Update {
        #[clap(long, short = 's', help = "Shortcut key to update")]
        shortcut: String,

        #[clap(long, short = 'n', help = "New shortcut key, defaults to the old one")]
        new_shortcut: Option<String>,

        #[clap(long, short = 'e', help = "New expansion text")]
        expansion: String,

        #[clap(long, short = 'd', help = "Optional description")]
        description: Option<String>,
    },
    /// List shortcuts grouped by category
    List {
        #[clap(long, short, help = "Only show this category")]
        category: Option<String>,

        #[clap(long, help = "Only show personal shortcuts")]
        personal: bool,
    },
    /// Search shortcuts by key, expansion or description
    Search { query: String },
    /// Run text through the editor pipeline as if it were typed
    Expand {
        text: String,

        #[clap(long, help = "Leave spelled-out numbers alone")]
        no_numbers: bool,
    },
    /// Show shortcut cache statistics
    Stats {
        #[clap(long, short, help = "Shortcuts to mark as recently used")]
        warm: Vec<String>,
    },
    /// Load system shortcuts from a JSON file
    Seed { file: PathBuf },
    /// Create a user or replace its token
    Register {
        #[clap(long, help = "User id")]
        id: String,

        #[clap(long, help = "Session token")]
        token: String,
    },
    /// Start the HTTP API server
    Serve {
        #[clap(long, short, default_value = "3000", help = "Port to listen on")]
        port: u16,
    },
    /// Check if the API server is responsive
    ApiStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_credentials_after_subcommand() {
        let cli = Kitzur::try_parse_from([
            "kitzur", "add", "-s", "עוד", "-e", "עורך דין", "--user", "dana", "--token", "t",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("dana"));
        assert!(matches!(
            cli.commands,
            Some(Commands::Add { ref shortcut, override_system: false, .. }) if shortcut == "עוד"
        ));
    }

    #[test]
    fn serve_defaults_port() {
        let cli = Kitzur::try_parse_from(["kitzur", "serve"]).unwrap();
        assert!(matches!(cli.commands, Some(Commands::Serve { port: 3000 })));
    }
}
