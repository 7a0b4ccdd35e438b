//! curator CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use curator::{
    commands::{
        cmd_create_project, cmd_ingest, cmd_init, cmd_list_projects, cmd_query, cmd_questions,
        cmd_remove_project, cmd_status, print_ingest_stats, print_projects, print_query_results,
        print_questions, print_status, QueryOptions,
    },
    config::Config,
    error::Result,
    meta::MetaDb,
    store::SearchEngine,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "curator")]
#[command(version, about = "Project-scoped semantic search over local documents", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize curator configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Ingest documents into a project
    Ingest {
        /// Project name or ID
        project: String,

        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Search a project's documents
    Search {
        /// Project name or ID
        project: String,

        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0-1)
        #[arg(short, long)]
        min_similarity: Option<f32>,
    },

    /// Show suggested questions derived from a project's documents
    Questions {
        /// Project name or ID
        project: String,

        /// Maximum number of questions
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Also derive key facts from document text
        #[arg(long)]
        facts: bool,
    },

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a new project
    Add {
        /// Project name (must be unique)
        name: String,

        /// Project description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List all projects
    List,

    /// Remove a project and all its documents
    Remove {
        /// Project name or ID
        project: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force).await;
    }

    // Handle completions command (doesn't need config/db)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "curator", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = load_config(cli.config.as_deref())?;
    let db = MetaDb::new(&config.paths.db_file).await?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Project { action } => match action {
            ProjectAction::Add { name, description } => {
                let project = cmd_create_project(&db, &name, &description).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&project)?);
                } else {
                    println!("✓ Created project '{}' (id {})", project.name, project.id);
                }
            }

            ProjectAction::List => {
                let projects = cmd_list_projects(&db).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&projects)?);
                } else {
                    print_projects(&projects);
                }
            }

            ProjectAction::Remove { project } => {
                let removed = cmd_remove_project(&db, &project).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&removed)?);
                } else {
                    println!("✓ Removed project '{}' and its documents", removed.name);
                }
            }
        },

        Commands::Ingest { project, paths } => {
            let stats = cmd_ingest(&config, &db, &project, &paths).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Search {
            project,
            query,
            limit,
            min_similarity,
        } => {
            let mut engine =
                SearchEngine::new(&config.embedding, config.paths.index_file.clone());

            let options = QueryOptions {
                k: limit,
                min_similarity,
            };

            let result = cmd_query(&config, &db, &mut engine, &project, &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_query_results(&result);
            }
        }

        Commands::Questions {
            project,
            limit,
            facts,
        } => {
            let view = cmd_questions(&config, &db, &project, limit, facts).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_questions(&view);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &db).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

async fn handle_init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    // If the user points at a config file or directory, its parent is the base
    let base_dir = config_path.map(|path| {
        if path.extension().is_some_and(|e| e == "toml") {
            path.parent().map(PathBuf::from).unwrap_or_else(Config::default_base_dir)
        } else {
            path
        }
    });

    let config = cmd_init(base_dir, force).await?;

    println!("✓ curator initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("\nNext steps:");
    println!("  1. Create a project: curator project add \"Research\"");
    println!("  2. Ingest documents: curator ingest Research /path/to/docs");
    println!("  3. Search: curator search Research \"what you are looking for\"");

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p),
        None => {
            let default_path = Config::default_config_path();
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                eprintln!(
                    "Config file not found: {}\nRun 'curator init' first.",
                    default_path.display()
                );
                std::process::exit(1);
            }
        }
    }
}
