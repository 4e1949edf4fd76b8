use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use together_apart::{api, llm::LlmClient, storage::ImageStore};
use together_core::Database;

#[derive(Parser)]
#[command(name = "together")]
#[command(about = "Relationship-maintenance server for long-distance couples")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Together Apart server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Apply pending schema migrations and exit
    Migrate,
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let db = Database::open_default()?;
    db.migrate()?;

    let state = api::AppState {
        db,
        llm: LlmClient::from_env(),
        images: ImageStore::open_default()?,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(
        "Together Apart server listening on http://127.0.0.1:{}",
        port
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "together_apart=debug,together_core=debug,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting Together Apart server on port {}", port);
            serve(port).await?;
        }
        Some(Commands::Migrate) => {
            let db = Database::open_default()?;
            db.migrate()?;
            println!("Database migrated");
        }
        None => {
            // Default: start server
            tracing::info!("Starting Together Apart server on port 3000");
            serve(3000).await?;
        }
    }

    Ok(())
}
