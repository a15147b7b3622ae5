mod config;

use clap::{Parser, Subcommand};
use config::EasytalkConfig;
use easytalk_agent::{SpeechSynthesizer, SuggestionGenerator};
use easytalk_core::UserProfile;
use easytalk_gateway::GatewayServer;
use easytalk_orchestrator::SessionOrchestrator;
use easytalk_session::{FileContextStore, FileProfileStore, ProfileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "easytalk", about = "EasyTalk: assisted speech for phone calls")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "easytalk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage caller profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print a stored profile as JSON
    Show { id: String },
    /// Create or replace a profile
    Set {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        location: String,
        #[arg(long)]
        language: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = EasytalkConfig::load(&cli.config).await?;

    let profiles = Arc::new(FileProfileStore::new(config.profiles_path()).await?);

    match cli.command {
        Commands::Serve { host, port } => {
            config.resolve_secrets(|var| std::env::var(var).ok());
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let contexts = Arc::new(FileContextStore::new(config.contexts_dir()).await?);
            let generator = Arc::new(SuggestionGenerator::new(config.model.clone()));
            let speech = Arc::new(SpeechSynthesizer::new(config.speech.clone()));
            info!(
                generation = ?config.model.provider,
                model = %config.model.model_id,
                speech = ?config.speech.provider,
                disclaimer = ?config.session.disclaimer,
                "Providers configured"
            );

            let orchestrator = Arc::new(SessionOrchestrator::new(
                profiles,
                contexts,
                generator,
                speech,
                config.session.disclaimer,
            ));
            let app = GatewayServer::build_with_config(orchestrator, &config.gateway_config());

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("EasyTalk listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show { id } => match profiles.get(&id).await? {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => anyhow::bail!("No profile stored for '{id}'"),
            },
            ProfileAction::Set {
                id,
                name,
                age,
                location,
                language,
            } => {
                let profile = UserProfile::new(id, name, age, location, language);
                profiles.put(&profile).await?;
                println!("Saved profile '{}'", profile.id);
                println!("Disclaimer: {}", profile.disclaimer());
            }
        },
    }

    Ok(())
}
