mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_delete, cmd_edit, cmd_export, cmd_image, cmd_import, cmd_list, cmd_show,
    cmd_total,
};
use crate::config::Config;
use caloriemeter_core::service::CalorieService;

#[derive(Parser)]
#[command(
    name = "caloriemeter",
    version,
    about = "Log foods and their calories, keep a running total"
)]
struct Cli {
    /// Database file (default: platform data dir, or $CALORIEMETER_DB)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product
    Add {
        /// Product title
        title: String,
        /// Calories (e.g. "105" or "105kcal")
        calories: String,
        /// Attach a photo (JPEG, PNG, HEIC, ...)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Save even if a product with the same title exists
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a product's title, calories or photo
    Edit {
        /// Product ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New calories
        #[arg(short, long)]
        calories: Option<String>,
        /// Replace the photo
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Save even if another product has the same title
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a product by ID
    Delete {
        /// Product ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all products, newest first, with the calorie total
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the calorie total across all products
    Total {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one product
    Show {
        /// Product ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a product's photo to a file
    Image {
        /// Product ID
        id: i64,
        /// Where to write the photo
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all products as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import products from a JSON export (upserts by UUID)
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CALORIEMETER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(path = %config.db_path.display(), "opening database");
    let svc = CalorieService::new(&config.db_path)?;

    match cli.command {
        Commands::Add {
            title,
            calories,
            image,
            yes,
            json,
        } => cmd_add(&svc, &title, &calories, image, yes, json),
        Commands::Edit {
            id,
            title,
            calories,
            image,
            yes,
            json,
        } => cmd_edit(&svc, id, title, calories.as_deref(), image, yes, json),
        Commands::Delete { id, yes, json } => cmd_delete(&svc, id, yes, json),
        Commands::List { json } => cmd_list(&svc, json),
        Commands::Total { json } => cmd_total(&svc, json),
        Commands::Show { id, json } => cmd_show(&svc, id, json),
        Commands::Image { id, output, json } => cmd_image(&svc, id, &output, json),
        Commands::Export { output } => cmd_export(&svc, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
    }
}
