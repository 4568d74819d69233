use clap::{ArgAction, Parser, Subcommand};
use commands::{config, recent, resolve};
use plexlink_config::{Config, PathManager};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "plexlink")]
#[command(about = "plexlink - Open what you watched on Plex in TMDB")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show now playing and recently watched items
    #[command(long_about = "Fetch active sessions and watch history from the Plex server, collapse binge-watched shows and show only the configured home users. With --resolve, every row is also resolved to its TMDB page.")]
    Recent {
        /// Maximum number of recent rows to show
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Resolve every row to its TMDB route
        #[arg(long, action = ArgAction::SetTrue)]
        resolve: bool,
    },
    /// Resolve one Plex item to its TMDB route
    #[command(long_about = "Look up a Plex item by rating key and resolve it to a TMDB movie, show or episode. On failure the attempted step, the reason and the diagnostic notes are printed together with a suggested search query.")]
    Resolve {
        /// Plex rating key of the item
        rating_key: String,
    },
    /// Configure credentials and settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show,

    /// Configure Plex (token-based authentication)
    #[command(long_about = "Configure the Plex token and, optionally, a direct server URL. You can find your Plex token by inspecting network requests in Plex Web (X-Plex-Token header).")]
    Plex {
        /// Plex API Token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Plex Server URL (optional, discovered through plex.tv when unset)
        #[arg(long)]
        server_url: Option<String>,

        /// Home user ids whose history is shown (comma-separated, empty shows everyone)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        preferred_users: Option<Vec<u64>>,
    },

    /// Configure TMDB
    Tmdb {
        /// TMDB API key (if not provided, will prompt)
        #[arg(long)]
        api_key: Option<String>,

        /// Language for TMDB results, e.g. en-US
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // A broken config file must not keep `config` commands from fixing it
    let path_manager = PathManager::default();
    let loaded = Config::load_or_default(&path_manager.config_file());
    let log_file = loaded
        .as_ref()
        .ok()
        .and_then(|c| c.logging.resolved_file(&path_manager.log_dir()));

    logging::init_logging(cli.verbose, cli.quiet, log_file).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Recent { limit, resolve } => {
            recent::run_recent(checked(loaded, &path_manager)?, &path_manager, limit, resolve, &output).await
        }
        Commands::Resolve { rating_key } => {
            resolve::run_resolve(checked(loaded, &path_manager)?, &path_manager, &rating_key, &output).await
        }
        Commands::Config { cmd } => config::run_config(cmd, &path_manager, &output).await,
    }
}

fn checked(config: anyhow::Result<Config>, path_manager: &PathManager) -> color_eyre::Result<Config> {
    let config_file = path_manager.config_file();
    let config = config
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid config {}: {}", config_file.display(), e))?;
    Ok(config)
}
