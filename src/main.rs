mod chat;
mod cities;
mod config;
mod error;
mod extract;
mod flights;
mod generate;
mod http;
mod intents;
mod metrics;
mod nlu;
mod otel;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{info, warn};

use crate::chat::ChatAgent;
use crate::config::Config;
use crate::flights::FlightClient;
use crate::generate::ReplyGenerator;
use crate::intents::IntentCatalog;
use crate::nlu::NluClient;
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    // OTEL graceful shutdown on success or error exit
    let _otel_guard = otel::init()?;

    info!("Starting travel chat agent");
    let config = Config::load();

    let intents = match IntentCatalog::load(&config.dataset_path) {
        Ok(catalog) => {
            info!(entries = catalog.len(), path = %config.dataset_path, "loaded intent dataset");
            catalog
        }
        Err(e) => {
            warn!(error = %e, path = %config.dataset_path, "intent dataset unavailable");
            IntentCatalog::empty()
        }
    };
    if intents.is_empty() {
        warn!("no intent patterns loaded; fallback replies will be generic");
    }

    let generator = ReplyGenerator::from_env(&config.completion_model);
    if generator.is_none() {
        info!("completion model disabled (OPENAI_API_KEY not set)");
    }
    let nlu = config
        .nlu_endpoint
        .as_deref()
        .map(|endpoint| NluClient::new(endpoint, &config.nlu_language));
    if nlu.is_some() {
        info!("NLU collaborator enabled");
    }

    let agent = Arc::new(ChatAgent::new(
        SessionStore::new(
            Duration::from_secs(config.session.idle_ttl_secs),
            config.session.max_sessions,
        ),
        FlightClient::new(&config.amadeus),
        intents,
        nlu,
        generator,
    ));

    let app = http::router(agent, &config.allowed_origin)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind = %config.bind_addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
