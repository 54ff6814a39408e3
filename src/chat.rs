//! Response composition: slot filling per session, then either a flight
//! search (all three slots known) or a conversational fallback reply.
//!
//! A session never resets on its own: once complete, every further message
//! re-runs the search with the stored slots until a newer value overwrites
//! one of them.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::AgentError;
use crate::extract;
use crate::flights::{FlightClient, SearchOutcome};
use crate::generate::{self, ReplyGenerator};
use crate::intents::IntentCatalog;
use crate::nlu::{NluClient, NluReply};
use crate::session::{SessionStore, TripSlots};

const NO_FLIGHTS_REPLY: &str = "No flights found for the specified criteria.";
const INVALID_LOCATION_REPLY: &str = "Origin, destination, and departure date must be provided.";
const GATHERING_PROMPT: &str =
    "I can look that up once I know where you're flying from, where you're going, and on what date.";

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub flight_info: Value,
}

impl ChatReply {
    fn without_flights(message: String) -> Self {
        Self {
            message,
            flight_info: Value::Array(Vec::new()),
        }
    }
}

pub struct ChatAgent {
    store: SessionStore,
    flights: FlightClient,
    intents: IntentCatalog,
    nlu: Option<NluClient>,
    generator: Option<ReplyGenerator>,
}

impl ChatAgent {
    pub fn new(
        store: SessionStore,
        flights: FlightClient,
        intents: IntentCatalog,
        nlu: Option<NluClient>,
        generator: Option<ReplyGenerator>,
    ) -> Self {
        Self {
            store,
            flights,
            intents,
            nlu,
            generator,
        }
    }

    #[instrument(skip(self, query))]
    pub async fn respond(&self, session: &str, query: &str) -> Result<ChatReply, AgentError> {
        let mut extracted = extract::extract_flight_details(query);

        let mut nlu_reply: Option<NluReply> = None;
        if let Some(nlu) = &self.nlu {
            let reply = nlu.detect_intent(session, query).await;
            // NLU slots only fill gaps; heuristic values win on conflict.
            if extracted.origin.is_none() {
                extracted.origin = reply.slot("origin");
            }
            if extracted.destination.is_none() {
                extracted.destination = reply.slot("destination");
            }
            if extracted.date.is_none() {
                extracted.date = reply.slot("date");
            }
            nlu_reply = Some(reply);
        }

        let slots = self.store.merge(session, &extracted).await;
        debug!(?slots, "session slots after merge");

        if let TripSlots {
            origin: Some(origin),
            destination: Some(destination),
            date: Some(date),
        } = &slots
        {
            let outcome = self.flights.search_cheapest(origin, destination, date).await?;
            return Ok(compose_search_reply(origin, destination, date, outcome));
        }

        let message = self.fallback_reply(query, nlu_reply).await?;
        Ok(ChatReply::without_flights(message))
    }

    async fn fallback_reply(
        &self,
        query: &str,
        nlu_reply: Option<NluReply>,
    ) -> Result<String, AgentError> {
        if let Some(reply) = nlu_reply {
            if !reply.fulfillment_text.is_empty() {
                return Ok(reply.fulfillment_text);
            }
        }
        if let Some(generator) = &self.generator {
            return generator.reply(query).await;
        }
        if let Some(entry) = self.intents.match_intent(query) {
            return Ok(generate::fill_placeholders(&entry.response));
        }
        Ok(GATHERING_PROMPT.to_string())
    }
}

fn compose_search_reply(
    origin: &str,
    destination: &str,
    date: &str,
    outcome: SearchOutcome,
) -> ChatReply {
    match outcome {
        SearchOutcome::Offers(payload) => {
            let count = payload
                .get("data")
                .and_then(|data| data.as_array())
                .map(|offers| offers.len())
                .unwrap_or(0);
            info!(count, origin, destination, date, "composed flight reply");
            ChatReply {
                message: format!(
                    "Great! I found {count} flights from {origin} to {destination} on {date}. Let's check them out!"
                ),
                flight_info: payload,
            }
        }
        SearchOutcome::NoFlights => ChatReply::without_flights(NO_FLIGHTS_REPLY.to_string()),
        SearchOutcome::InvalidLocation => {
            ChatReply::without_flights(INVALID_LOCATION_REPLY.to_string())
        }
        SearchOutcome::Upstream(message) => ChatReply::without_flights(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmadeusConfig;
    use serde_json::json;
    use std::time::Duration;

    fn offline_flights() -> FlightClient {
        FlightClient::new(&AmadeusConfig {
            api_key: String::new(),
            api_secret: String::new(),
            token_url: "http://127.0.0.1:1/token".into(),
            search_url: "http://127.0.0.1:1/search".into(),
            currency: "USD".into(),
            max_offers: 5,
        })
    }

    fn agent_with(intents: IntentCatalog) -> ChatAgent {
        ChatAgent::new(
            SessionStore::new(Duration::from_secs(60), 16),
            offline_flights(),
            intents,
            None,
            None,
        )
    }

    fn greeting_catalog() -> IntentCatalog {
        IntentCatalog::from_json(
            r#"[{"intent": "greeting", "input": ["hello"], "response": "Hi! Tell me {origin}."}]"#,
        )
        .expect("catalog parses")
    }

    #[tokio::test]
    async fn test_incomplete_slots_fall_back_to_intent_match() {
        let agent = agent_with(greeting_catalog());
        let reply = agent.respond("s1", "hello").await.expect("reply composed");
        assert_eq!(reply.message, "Hi! Tell me your departure city.");
        assert_eq!(reply.flight_info, json!([]));
    }

    #[tokio::test]
    async fn test_incomplete_slots_canned_prompt_without_match() {
        let agent = agent_with(IntentCatalog::empty());
        let reply = agent
            .respond("s1", "I'd like to travel somewhere")
            .await
            .expect("reply composed");
        assert_eq!(reply.message, GATHERING_PROMPT);
        assert_eq!(reply.flight_info, json!([]));
    }

    #[tokio::test]
    async fn test_slots_accumulate_across_turns() {
        let agent = agent_with(IntentCatalog::empty());
        agent
            .respond("s1", "flying from Tokyo to London")
            .await
            .expect("reply composed");
        // Third slot arrives later; the search now runs and fails fast on the
        // offline client's empty credentials.
        let result = agent.respond("s1", "on 2025-03-01 please").await;
        assert!(matches!(result, Err(AgentError::FlightSearch(_))));
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_slots() {
        let agent = agent_with(IntentCatalog::empty());
        agent
            .respond("s1", "from Tokyo to London on 2025-03-01")
            .await
            .err()
            .expect("complete session reaches the search");
        let reply = agent
            .respond("s2", "anything for me?")
            .await
            .expect("fresh session stays in gathering");
        assert_eq!(reply.flight_info, json!([]));
    }

    #[test]
    fn test_compose_offers_reply_counts_flights() {
        let payload = json!({"data": [{"id": "1"}, {"id": "2"}]});
        let reply = compose_search_reply("Tokyo", "London", "2025-03-01", SearchOutcome::Offers(payload.clone()));
        assert_eq!(
            reply.message,
            "Great! I found 2 flights from Tokyo to London on 2025-03-01. Let's check them out!"
        );
        assert_eq!(reply.flight_info, payload);
    }

    #[test]
    fn test_compose_no_flights_reply() {
        let reply = compose_search_reply("Tokyo", "London", "2025-03-01", SearchOutcome::NoFlights);
        assert_eq!(reply.message, NO_FLIGHTS_REPLY);
        assert_eq!(reply.flight_info, json!([]));
    }

    #[test]
    fn test_compose_invalid_location_reply() {
        let reply =
            compose_search_reply("Gotham", "London", "2025-03-01", SearchOutcome::InvalidLocation);
        assert_eq!(reply.message, INVALID_LOCATION_REPLY);
        assert_eq!(reply.flight_info, json!([]));
    }

    #[test]
    fn test_compose_upstream_reply_carries_message() {
        let reply = compose_search_reply(
            "Tokyo",
            "London",
            "2025-03-01",
            SearchOutcome::Upstream("Could not retrieve flight offers from Amadeus API.".into()),
        );
        assert_eq!(reply.message, "Could not retrieve flight offers from Amadeus API.");
        assert_eq!(reply.flight_info, json!([]));
    }
}
