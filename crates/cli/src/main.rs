use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use erudio_app::App;
use erudio_kernel::settings::Settings;

/// erudio - people and books REST service
#[derive(Parser)]
#[command(name = "erudio")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding base.toml and the environment overlays
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to apply (local, staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the merged OpenAPI document
    Openapi {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        match (&self.config_dir, &self.env) {
            (None, None) => Settings::load(),
            (config_dir, env) => {
                let config_dir = match config_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir()
                        .with_context(|| "unable to resolve current directory")?
                        .join("config"),
                };
                Settings::load_from(&config_dir, env.as_deref().unwrap_or("local"))
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli
        .settings()
        .with_context(|| "failed to load erudio settings")?;

    match cli.command {
        Commands::Serve => {
            erudio_telemetry::init(&settings.telemetry)?;
            App::connect(settings).await?.serve().await
        }
        Commands::Migrate => {
            erudio_telemetry::init(&settings.telemetry)?;
            let app = App::connect(settings).await?;
            let applied = app.migrate().await?;
            println!("applied {} migration(s)", applied);
            Ok(())
        }
        Commands::Openapi { output } => {
            let db = erudio_db::connect_lazy(&settings.database)?;
            let document = App::with_pool(settings, db).openapi();
            let rendered = serde_json::to_string_pretty(&document)?;

            match output {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", rendered),
            }
            Ok(())
        }
    }
}
