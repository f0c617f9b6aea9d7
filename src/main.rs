use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use basecoat::config::ServerConfig;
use basecoat::server::dto::{FormulaSubmission, IdField, PayloadField, SubmitCommand};
use basecoat::server::{AppState, create_router};
use basecoat::store::{SqliteStore, Store};
use basecoat::types::FormulaDetail;

#[derive(Parser)]
#[command(name = "basecoat")]
#[command(about = "Record keeping for paint shop color formulas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags given here override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Database file, if not <data-dir>/basecoat.db
        #[arg(long)]
        database: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Inspect and manage formulas
    Formulas {
        #[command(subcommand)]
        command: FormulaCommands,
    },
}

#[derive(Subcommand)]
enum FormulaCommands {
    /// List all formulas
    List {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one formula with its colorants and bases
    Show {
        id: i64,

        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a formula
    Create {
        /// Formula name
        name: String,

        #[command(flatten)]
        fields: FormulaFields,

        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Update a formula; only the given values change
    Update {
        id: i64,

        /// New formula name
        #[arg(long, short)]
        name: Option<String>,

        #[command(flatten)]
        fields: FormulaFields,

        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Delete a formula and its colorants and bases
    Delete {
        id: i64,

        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Args)]
struct FormulaFields {
    /// Formula number used in the shop
    #[arg(long, short = 'u')]
    number: Option<String>,

    /// Customer the formula was mixed for
    #[arg(long, short)]
    customer: Option<String>,

    #[arg(long, short)]
    summary: Option<String>,

    /// Additional notes
    #[arg(long, short = 'o')]
    notes: Option<String>,

    /// Colorants as JSON, e.g. '[{"colorant_name": "umber", "amount": 2}]'
    #[arg(long)]
    colorants: Option<String>,

    /// Bases as JSON, e.g. '[{"base_name": "pastel", "product_name": "ppg"}]'
    #[arg(long)]
    bases: Option<String>,
}

impl FormulaFields {
    fn into_submission(self, id: Option<i64>, name: Option<String>) -> FormulaSubmission {
        FormulaSubmission {
            formula_id: id.map(IdField::Number),
            formula_name: name,
            formula_number: self.number,
            customer_name: self.customer,
            summary: self.summary,
            notes: self.notes,
            colorants: self.colorants.map(PayloadField::Encoded),
            bases: self.bases.map(PayloadField::Encoded),
        }
    }
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let directive = if debug { "basecoat=debug" } else { "basecoat=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn open_store(data_dir: PathBuf) -> anyhow::Result<SqliteStore> {
    let config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    let db_path = config.db_path();

    if !db_path.exists() {
        bail!("Database not initialized. Run 'basecoat init' first.");
    }

    let store = SqliteStore::new(&db_path)?;
    if !store.has_schema()? {
        bail!("Database not initialized. Run 'basecoat init' first.");
    }

    Ok(store)
}

fn run_init(data_dir: PathBuf) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;

    let config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    let db_path = config.db_path();

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    store.close()?;

    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn print_detail(detail: &FormulaDetail) {
    let formula = &detail.formula;
    println!("{} (#{})", formula.formula_name, formula.id);
    println!("  number:        {}", formula.formula_number);
    println!("  customer:      {}", formula.customer_name);
    println!("  summary:       {}", formula.summary);
    println!("  notes:         {}", formula.notes);
    println!("  created:       {}", formula.created_date.to_rfc3339());
    println!("  last modified: {}", formula.last_modified.to_rfc3339());

    println!("  colorants:");
    for colorant in &detail.colorants {
        println!("    - {} ({})", colorant.colorant_name, colorant.amount);
    }

    println!("  bases:");
    for base in &detail.bases {
        println!("    - {} / {}", base.base_name, base.product_name);
    }
}

/// Applies a submission the same way `POST /formula/add` does.
fn submit(store: &SqliteStore, submission: FormulaSubmission) -> anyhow::Result<FormulaDetail> {
    let detail = match submission.into_command()? {
        SubmitCommand::Create(draft) => store.create_formula(&draft)?,
        SubmitCommand::Update { id, update } => store.update_formula(id, &update)?,
    };
    Ok(detail)
}

fn run_formulas(command: FormulaCommands) -> anyhow::Result<()> {
    match command {
        FormulaCommands::List { data_dir, json } => {
            let store = open_store(data_dir)?;
            let formulas = store.list_formulas()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&formulas)?);
            } else if formulas.is_empty() {
                println!("No formulas");
            } else {
                for formula in &formulas {
                    println!(
                        "{}\t{}\t{}\t{}",
                        formula.id, formula.formula_name, formula.formula_number, formula.customer_name
                    );
                }
            }
        }
        FormulaCommands::Show { id, data_dir, json } => {
            let store = open_store(data_dir)?;
            let Some(detail) = store.get_formula_detail(id)? else {
                bail!("Formula not found");
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print_detail(&detail);
            }
        }
        FormulaCommands::Create {
            name,
            fields,
            data_dir,
        } => {
            let store = open_store(data_dir)?;
            let detail = submit(&store, fields.into_submission(None, Some(name)))?;
            info!("Created formula {}", detail.formula.id);
            println!(
                "Created formula {} ({})",
                detail.formula.id, detail.formula.formula_name
            );
        }
        FormulaCommands::Update {
            id,
            name,
            fields,
            data_dir,
        } => {
            let store = open_store(data_dir)?;
            let detail = submit(&store, fields.into_submission(Some(id), name))?;
            info!("Updated formula {id}");
            println!(
                "Updated formula {} ({})",
                detail.formula.id, detail.formula.formula_name
            );
        }
        FormulaCommands::Delete { id, data_dir } => {
            let store = open_store(data_dir)?;
            if !store.delete_formula(id)? {
                bail!("Formula not found");
            }
            println!("Deleted formula {id}");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    let store = Arc::new(SqliteStore::new(&db_path)?);
    store.initialize()?;

    info!("Using database at {}", db_path.display());

    let state = Arc::new(AppState::new(store.clone()));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            init_tracing(false)?;
            run_init(data_dir)?;
        }
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            database,
            debug,
        } => {
            let mut server_config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            if let Some(data_dir) = data_dir {
                server_config.data_dir = data_dir;
            }
            if database.is_some() {
                server_config.database = database;
            }
            server_config.debug |= debug;

            init_tracing(server_config.debug)?;
            run_serve(server_config).await?;
        }
        Commands::Formulas { command } => {
            init_tracing(false)?;
            run_formulas(command)?;
        }
    }

    Ok(())
}
