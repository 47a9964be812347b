use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moit_agent::agent::Agent;
use moit_agent::server::{app, AppState};
use moit_agent::Config;

#[derive(Parser)]
#[command(name = "moit-agent", about = "Multi-agent recommendation server")]
struct Cli {
    /// Bind address override, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moit_agent=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env()?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let llm = moit_agent::llm::create_text_generator(&config.llm)?;
    let vision = moit_agent::llm::create_image_analyzer(&config.vision)?;
    let search = moit_agent::search::create_similarity_search(&config.search)?;
    let catalog = moit_agent::catalog::create_catalog_store(&config.catalog);

    let agent = Arc::new(Agent::new(
        &config.agent,
        llm,
        search.clone(),
        vision,
        catalog,
    ));

    let state = AppState { agent, search };
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Listening on {bind}");
    axum::serve(listener, router).await?;

    Ok(())
}
