//! shelf CLI - browse a Mendeley Desktop library from the terminal

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use mendeley_shelf::config::{self, ShelfConfig};
use mendeley_shelf::storage::{self, Library, RepairReport};
use mendeley_shelf::{QueryEngine, SchemaSource, markup, ui};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(version)]
#[command(about = "Read access to a Mendeley Desktop library")]
#[command(long_about = r#"
shelf repairs loosely typed rows in a Mendeley Desktop database and lists
the documents of a folder or shared collection.

Example usage:
  shelf --account you@example.org folder "Thesis"
  shelf --database ./library.sqlite collection "Lab Shared" --json
  shelf repair --strict
  echo "line one" | shelf escape
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the Mendeley database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Mendeley account name, used to locate the database
    #[arg(short, long, global = true)]
    account: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Read declared column types from CREATE TABLE text instead of PRAGMA table_info
    #[arg(long, global = true)]
    ddl_schema: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run only the type repair pass and print its report
    Repair {
        /// Fail, without committing, if any value cannot be repaired
        #[arg(long)]
        strict: bool,
    },

    /// List the alive documents of a folder
    Folder {
        /// Folder name (exact match)
        name: String,
    },

    /// List the alive documents of a shared collection
    Collection {
        /// Collection name (exact match)
        name: String,
    },

    /// List all folders
    Folders,

    /// List all shared collections
    Collections,

    /// Show library statistics
    Stats,

    /// Convert note markup to plain text (reads stdin when TEXT is omitted)
    Unescape { text: Option<String> },

    /// Convert plain text to note markup (reads stdin when TEXT is omitted)
    Escape { text: Option<String> },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(database) = &cli.database {
        settings.database = Some(database.display().to_string());
    }
    if let Some(account) = &cli.account {
        settings.account = Some(account.clone());
    }
    if cli.ddl_schema {
        settings.schema_source = SchemaSource::Ddl;
    }

    match cli.command {
        Commands::Unescape { text } => {
            println!("{}", markup::unescape(&input(text)?));
        }

        Commands::Escape { text } => {
            println!("{}", markup::escape(&input(text)?)?);
        }

        Commands::Repair { strict } => {
            settings.strict |= strict;
            let path = database_path(&settings)?;
            tracing::info!("Repairing {}", path.display());
            let report = storage::repair_database(&path, &settings.open_options())?;
            print_report(&report, cli.json)?;
        }

        Commands::Folder { name } => {
            let library = open(&settings, cli.json)?;
            let documents = QueryEngine::new(&library).documents_from_folder(&name)?.fetch()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else if documents.is_empty() {
                ui::empty(&format!("No documents in folder '{}'.", name));
            } else {
                ui::header(&format!("Folder: {} ({} document(s))", name, documents.len()));
                println!("{}", ui::documents_table(&documents));
            }
        }

        Commands::Collection { name } => {
            let library = open(&settings, cli.json)?;
            let documents = QueryEngine::new(&library)
                .documents_from_shared_collection(&name)?
                .fetch()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else if documents.is_empty() {
                ui::empty(&format!("No documents in shared collection '{}'.", name));
            } else {
                ui::header(&format!("Collection: {} ({} document(s))", name, documents.len()));
                println!("{}", ui::documents_table(&documents));
            }
        }

        Commands::Folders => {
            let library = open(&settings, cli.json)?;
            let folders = library.folders()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&folders)?);
            } else if folders.is_empty() {
                ui::empty("No folders.");
            } else {
                println!("{}", ui::named_table(&folders));
            }
        }

        Commands::Collections => {
            let library = open(&settings, cli.json)?;
            let groups = library.groups()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else if groups.is_empty() {
                ui::empty("No shared collections.");
            } else {
                println!("{}", ui::named_table(&groups));
            }
        }

        Commands::Stats => {
            let library = open(&settings, cli.json)?;
            let stats = library.stats()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                ui::info("Database", &library.path().display().to_string());
                println!("{}", stats);
            }
        }
    }

    Ok(())
}

fn database_path(settings: &ShelfConfig) -> anyhow::Result<PathBuf> {
    let explicit = settings.database.as_ref().map(PathBuf::from);
    Ok(config::resolve_database_path(explicit.as_deref(), settings.account.as_deref())?)
}

/// Repair, then open the query session; warn about anything left unrepaired
fn open(settings: &ShelfConfig, json: bool) -> anyhow::Result<Library> {
    let path = database_path(settings)?;
    let (library, report) = Library::open(&path, &settings.open_options())?;
    if !json && !report.is_clean() {
        for anomaly in report.unrepairable() {
            ui::warn(&format!(
                "{}.{} holds values that are not integers: {:?}",
                anomaly.table, anomaly.column, anomaly.values
            ));
        }
    }
    Ok(library)
}

fn print_report(report: &RepairReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    ui::section("Repair");
    let table = ui::repair_table(report);
    if !table.is_empty() {
        println!("{}", table);
    }
    println!("{}", report);

    if report.is_clean() {
        ui::success("All integer columns hold integers.");
    } else {
        ui::warn("Some values were left unchanged; rerun with --strict to refuse them.");
    }
    Ok(())
}

fn input(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}
