//! Kaisen combat analytics CLI
//!
//! Acquires the combat dataset from the Kaisen service and runs the three
//! analytical views over the stored snapshots.

use clap::{Parser, Subcommand};
use kaisen::{Config, Result};

#[derive(Parser)]
#[command(name = "kaisen")]
#[command(about = "ETL and combat analytics for the Kaisen creature-combat service", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default config file and the data directory
    Init,
    /// Run the full acquisition pipeline and write snapshots
    Fetch,
    /// Show stored snapshot status
    Status,
    /// Run analyses over the stored snapshots
    Analyze {
        #[command(subcommand)]
        view: AnalyzeCommands,
    },
}

#[derive(Subcommand)]
enum AnalyzeCommands {
    /// Rank attribute differences by their influence on victory
    Importance,
    /// Mean win rate per creature type
    Types,
    /// Leaderboard of top performers
    Roster {
        /// Minimum number of recorded fights (inclusive)
        #[arg(long)]
        min_fights: Option<u32>,
        /// Show only the top N entries
        #[arg(long, default_value = "20")]
        top: usize,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Run all three analyses; one failing does not stop the others
    All {
        /// Minimum number of recorded fights for the roster (inclusive)
        #[arg(long)]
        min_fights: Option<u32>,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };
    config.apply_env_overrides();

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Fetch => commands::fetch(&config),
        Commands::Status => commands::status(&config),
        Commands::Analyze { view } => match view {
            AnalyzeCommands::Importance => commands::analyze_importance(&config),
            AnalyzeCommands::Types => commands::analyze_types(&config),
            AnalyzeCommands::Roster {
                min_fights,
                top,
                format,
            } => commands::analyze_roster(&config, min_fights, top, format),
            AnalyzeCommands::All { min_fights } => commands::analyze_all(&config, min_fights),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use kaisen::analysis::{importance, roster, types};
    use kaisen::data::api::ApiClient;
    use kaisen::data::assemble;
    use kaisen::data::store::{self, TabularStore};
    use kaisen::data::Table;
    use kaisen::oracle::LogisticOracle;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.data_dir)?;
        println!("Created {}/ directory", config.data.data_dir);

        println!("\nNext steps:");
        println!("  1. Edit {} (or set KAISEN_API_URL/USER/PASS)", config_path);
        println!("  2. Run 'kaisen fetch' to acquire the combat dataset");
        println!("  3. Run 'kaisen analyze all' for the three views");
        Ok(())
    }

    pub fn fetch(config: &Config) -> Result<()> {
        let mut client = ApiClient::new(&config.api.base_url, config.api.timeout_secs)?;
        client.login(&config.api.username, &config.api.password)?;

        let tables = assemble::assemble(&client)?;
        let store = TabularStore::new(&config.data.data_dir);
        assemble::write_snapshots(&store, &tables);

        println!(
            "Acquired {} creatures, {} attribute rows, {} combats",
            tables.creatures.len(),
            tables.attributes.len(),
            tables.combats.len()
        );
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let store = TabularStore::new(&config.data.data_dir);
        for name in [
            store::CREATURE_LIST,
            store::CREATURE_ATTRIBUTES,
            store::COMBAT_LIST,
        ] {
            match store.read(name) {
                Ok(table) => println!(
                    "{:<22} {:>6} rows, {} columns",
                    name,
                    table.len(),
                    table.columns().len()
                ),
                Err(_) => println!("{:<22} missing (run 'kaisen fetch')", name),
            }
        }
        Ok(())
    }

    /// Load the two analysis inputs once per invocation.
    fn load_tables(config: &Config) -> Result<(Table, Table)> {
        let store = TabularStore::new(&config.data.data_dir);
        let combats = store.read(store::COMBAT_LIST)?;
        let attributes = store.read(store::CREATURE_ATTRIBUTES)?;
        Ok((combats, attributes))
    }

    pub fn analyze_importance(config: &Config) -> Result<()> {
        let (combats, attributes) = load_tables(config)?;
        run_importance(config, &combats, &attributes)
    }

    fn run_importance(config: &Config, combats: &Table, attributes: &Table) -> Result<()> {
        let oracle = LogisticOracle::new(
            config.oracle.epochs,
            config.oracle.learning_rate,
            config.oracle.seed,
        );
        let ranked = importance::rank_features(combats, attributes, &oracle)?;

        println!("Attribute influence on victory:");
        for entry in &ranked {
            println!("  {:<16} {:.4}", entry.feature, entry.importance);
        }
        Ok(())
    }

    pub fn analyze_types(config: &Config) -> Result<()> {
        let (combats, attributes) = load_tables(config)?;
        run_types(&combats, &attributes)
    }

    fn run_types(combats: &Table, attributes: &Table) -> Result<()> {
        let ranked = types::type_win_rates(combats, attributes)?;
        if ranked.is_empty() {
            println!("No type carries any recorded fight.");
            return Ok(());
        }

        println!("Mean win rate by type:");
        for entry in &ranked {
            println!(
                "  {:<14} {:>6.2}%  ({} creatures)",
                entry.type_name,
                entry.mean_win_rate * 100.0,
                entry.entity_count
            );
        }
        Ok(())
    }

    pub fn analyze_roster(
        config: &Config,
        min_fights: Option<u32>,
        top: usize,
        format: OutputFormat,
    ) -> Result<()> {
        let (combats, attributes) = load_tables(config)?;
        let min_fights = min_fights.unwrap_or(config.data.min_fights);
        let roster = roster::dream_team(&combats, &attributes, min_fights)?;

        match format {
            OutputFormat::Json => {
                let entries: Vec<_> = roster.iter().take(top).collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Table => print_roster(&roster, min_fights, top),
        }
        Ok(())
    }

    fn print_roster(roster: &[roster::RosterEntry], min_fights: u32, top: usize) {
        if roster.is_empty() {
            println!(
                "No creature has {} or more recorded fights.",
                min_fights
            );
            return;
        }

        println!("Dream team (minimum {} fights):", min_fights);
        println!(
            "  {:<16} {:<6} {:<24} {:>7} {:>6} {:>8}",
            "name", "id", "types", "fights", "wins", "win %"
        );
        for entry in roster.iter().take(top) {
            println!(
                "  {:<16} {:<6} {:<24} {:>7} {:>6} {:>8.2}",
                entry.name.as_deref().unwrap_or("-"),
                entry.id,
                entry.types.as_deref().unwrap_or("-"),
                entry.fights,
                entry.wins,
                entry.win_rate_pct
            );
        }
    }

    pub fn analyze_all(config: &Config, min_fights: Option<u32>) -> Result<()> {
        let (combats, attributes) = load_tables(config)?;
        let min_fights = min_fights.unwrap_or(config.data.min_fights);

        if let Err(e) = run_importance(config, &combats, &attributes) {
            log::error!("Attribute importance analysis failed: {}", e);
        }
        println!();
        if let Err(e) = run_types(&combats, &attributes) {
            log::error!("Type win-rate analysis failed: {}", e);
        }
        println!();
        match roster::dream_team(&combats, &attributes, min_fights) {
            Ok(roster) => print_roster(&roster, min_fights, 20),
            Err(e) => log::error!("Roster analysis failed: {}", e),
        }
        Ok(())
    }
}
