//! Conversational reply generation through a hosted completion model.

use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use rig::providers::openai::completion::CompletionModel;
use tracing::{info, instrument};

use crate::error::AgentError;

const PREAMBLE: &str = "You are a friendly travel assistant. Help the user plan \
a flight and ask for whichever of departure city, destination city, and travel \
date they have not given yet.";

/// Replace dataset-style template slots with generic phrasing.
pub fn fill_placeholders(text: &str) -> String {
    text.replace("{origin}", "your departure city")
        .replace("{destination}", "your destination city")
        .replace("{date}", "your travel date")
}

pub struct ReplyGenerator {
    agent: Agent<CompletionModel>,
}

impl ReplyGenerator {
    /// Wire up the completion model, or `None` when no API key is configured.
    pub fn from_env(model: &str) -> Option<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            return None;
        }
        let client = openai::Client::from_env();
        let agent = client.agent(model).preamble(PREAMBLE).build();
        info!(model, "completion model enabled");
        Some(Self { agent })
    }

    #[instrument(skip(self, query))]
    pub async fn reply(&self, query: &str) -> Result<String, AgentError> {
        let text = self
            .agent
            .prompt(query)
            .await
            .map_err(|e| AgentError::Generation(e.to_string()))?;
        Ok(fill_placeholders(&text))
    }
}
