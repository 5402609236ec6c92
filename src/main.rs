use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use sitekeeper::backend::factory::create_store;
use sitekeeper::config::Config;
use sitekeeper::connectivity::{diagnostics, ConnectivityProber};
use sitekeeper::constants::ADVISORY_WORKING_OFFLINE;
use sitekeeper::logger::init_logging;
use sitekeeper::migration::Migrator;
use sitekeeper::models::{Collection, ContactSubmission, Entity, Project, Service, TeamMember};
use sitekeeper::storage::{KeyValueStore, LocalCache, LocalStorage};
use sitekeeper::sync::{Outcome, SiteData};
use sitekeeper::RecordId;

#[derive(Parser)]
#[command(name = "sitekeeper")]
#[command(about = "Team website content store with local cache fallback")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every record of a collection
    List {
        /// teamMembers, projects, services or contactSubmissions
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },

    /// Mark a contact submission as read
    MarkRead {
        /// Submission id
        id: String,
    },

    /// Copy the local cache into the remote store
    Migrate,

    /// Run the remote connection diagnostics
    Diagnose,

    /// Check once whether the remote store is reachable
    Probe,

    /// Local cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Drop the cached copy of a collection
    Clear {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Destination; defaults to the user config directory
        path: Option<PathBuf>,
    },
}

fn parse_collection(value: &str) -> Result<Collection, String> {
    Collection::parse(value).ok_or_else(|| {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
        format!("unknown collection '{value}', expected one of: {}", names.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Writing a config file must work before any valid config exists
    if let Commands::Config {
        command: ConfigCommands::Init { path },
    } = &cli.command
    {
        return init_config(path.clone());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    let _logs = init_logging(&config.logging)?;

    run(cli.command, &config).await
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::get_default_config_path()?,
    };
    Config::generate_default_config(path)
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    let store = create_store(&config.remote)?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(LocalStorage::new(&config.cache.database_url).await?);

    match command {
        Commands::List { collection } => {
            let site = SiteData::new(store, kv);
            match collection {
                Collection::TeamMembers => print_outcome(&site.team_members.get_all().await)?,
                Collection::Projects => print_outcome(&site.projects.get_all().await)?,
                Collection::Services => print_outcome(&site.services.get_all().await)?,
                Collection::ContactSubmissions => print_outcome(&site.contacts.get_all().await)?,
            }
        }
        Commands::MarkRead { id } => {
            let site = SiteData::new(store, kv);
            print_outcome(&site.contacts.mark_as_read(&RecordId::new(id)).await)?;
        }
        Commands::Migrate => {
            let report = Migrator::new(store, kv).migrate().await;
            print_json(&report)?;
        }
        Commands::Diagnose => {
            let report = diagnostics::run(store.as_ref()).await;
            print_json(&report)?;
        }
        Commands::Probe => {
            let online = ConnectivityProber::new(store, &config.connectivity).check_now().await;
            if !online {
                eprintln!("⚠️  {ADVISORY_WORKING_OFFLINE}");
            }
            print_json(&json!({ "online": online }))?;
        }
        Commands::Cache {
            command: CacheCommands::Clear { collection },
        } => {
            match collection {
                Collection::TeamMembers => clear_cache::<TeamMember>(kv).await,
                Collection::Projects => clear_cache::<Project>(kv).await,
                Collection::Services => clear_cache::<Service>(kv).await,
                Collection::ContactSubmissions => clear_cache::<ContactSubmission>(kv).await,
            }
            println!("✅ Cleared cached {collection}");
        }
        Commands::Config {
            command: ConfigCommands::Init { path },
        } => init_config(path)?,
    }

    Ok(())
}

async fn clear_cache<E: Entity>(kv: Arc<dyn KeyValueStore>) {
    LocalCache::<E>::new(kv).remove().await;
}

fn print_outcome<T: Serialize>(outcome: &Outcome<T>) -> Result<()> {
    if let Some(advisory) = outcome.advisory() {
        eprintln!("⚠️  {advisory}");
    }
    print_json(&outcome.value)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
