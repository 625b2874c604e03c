use anyhow::Result;
use clap::{Parser, Subcommand};

use kontaktio::cli;

#[derive(Debug, Parser)]
#[command(name = "kontaktio")]
#[command(about = "Admin console for hosted chatbot widget configurations")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in to the admin API and store the session token
    Login {
        /// Admin password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Discard the stored session token
    Logout,
    /// Show session, backend, and configuration state
    Status,
    /// List clients
    List {
        /// Case-insensitive match on client id or company name
        #[arg(long)]
        filter: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show a client's configuration
    Show {
        /// Client id (defaults to the last selected client)
        id: Option<String>,
        /// Only render this tab
        #[arg(long)]
        tab: Option<String>,
    },
    /// Create a client, optionally copying another client's configuration
    Create {
        id: String,
        /// Template client to copy
        #[arg(long)]
        from: Option<String>,
    },
    /// Copy a client's configuration under a new id
    Duplicate {
        new_id: String,
        /// Source client (defaults to the last selected client)
        #[arg(long)]
        from: Option<String>,
    },
    /// Set fields and save: `set [id] path=value...`
    Set {
        #[arg(required = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Interactive edit session
    Edit {
        id: Option<String>,
    },
    /// Delete a client
    Delete {
        id: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show conversation statistics
    Stats {
        id: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent conversation messages
    Logs {
        id: Option<String>,
        /// Maximum number of messages
        #[arg(long)]
        limit: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print (and optionally open) the widget preview URL
    Preview {
        id: Option<String>,
        #[arg(long)]
        open: bool,
    },
    /// Export a client's configuration as JSON
    Export {
        id: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
    /// Import a JSON configuration into a client and save it: `import [id] <file>`
    Import {
        #[arg(required = true, num_args = 1..=2)]
        args: Vec<String>,
    },
    /// Show the local activity log
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `config set api.base_url https://...`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Login { password } => cli::run_login(password),
        Commands::Logout => cli::run_logout(),
        Commands::Status => cli::run_status(),
        Commands::List { filter, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_list(filter.as_deref(), fmt)
        }
        Commands::Show { id, tab } => cli::run_show(id.as_deref(), tab.as_deref()),
        Commands::Create { id, from } => cli::run_create(&id, from.as_deref()),
        Commands::Duplicate { new_id, from } => cli::run_duplicate(&new_id, from.as_deref()),
        Commands::Set { args } => cli::run_set(&args),
        Commands::Edit { id } => cli::run_edit(id.as_deref()),
        Commands::Delete { id, yes } => cli::run_delete(id.as_deref(), yes),
        Commands::Stats { id, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(id.as_deref(), fmt)
        }
        Commands::Logs { id, limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_logs(id.as_deref(), limit, fmt)
        }
        Commands::Preview { id, open } => cli::run_preview(id.as_deref(), open),
        Commands::Export { id, out } => cli::run_export(id.as_deref(), out.as_deref()),
        Commands::Import { args } => cli::run_import(&args),
        Commands::History { limit } => cli::run_history(limit),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
