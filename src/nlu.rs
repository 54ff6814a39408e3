//! Optional NLU collaborator client.
//!
//! Sends the session id and query text to a configured intent-detection
//! endpoint and reads back a fulfillment text plus slot parameters (arrays
//! of values; the first element is used). Detection never fails the caller:
//! any transport or decode problem collapses into a canned apology with no
//! slots.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

const FALLBACK_FULFILLMENT: &str = "Sorry, I couldn't understand that.";

#[derive(Debug, Default, Deserialize)]
pub struct NluReply {
    #[serde(default)]
    pub fulfillment_text: String,
    #[serde(default)]
    pub parameters: HashMap<String, Vec<String>>,
}

impl NluReply {
    /// First value of a slot parameter, if the NLU filled it.
    pub fn slot(&self, name: &str) -> Option<String> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn fallback() -> Self {
        Self {
            fulfillment_text: FALLBACK_FULFILLMENT.to_string(),
            parameters: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NluClient {
    http: reqwest::Client,
    endpoint: String,
    language: String,
}

impl NluClient {
    pub fn new(endpoint: &str, language: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            language: language.to_string(),
        }
    }

    #[instrument(skip(self, text))]
    pub async fn detect_intent(&self, session: &str, text: &str) -> NluReply {
        let body = json!({
            "session": session,
            "query": {
                "text": text,
                "language_code": self.language,
            },
        });
        let response = match self.http.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "intent detection request failed");
                return NluReply::fallback();
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "intent detection returned an error");
            return NluReply::fallback();
        }
        match response.json::<NluReply>().await {
            Ok(reply) => {
                debug!(slots = reply.parameters.len(), "intent detected");
                reply
            }
            Err(e) => {
                warn!(error = %e, "intent detection response did not decode");
                NluReply::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_takes_first_value() {
        let reply: NluReply = serde_json::from_str(
            r#"{"fulfillment_text": "ok", "parameters": {"origin": ["Tokyo", "Osaka"]}}"#,
        )
        .expect("reply decodes");
        assert_eq!(reply.slot("origin").as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_slot_absent_or_empty() {
        let reply: NluReply = serde_json::from_str(
            r#"{"fulfillment_text": "ok", "parameters": {"date": [], "origin": [""]}}"#,
        )
        .expect("reply decodes");
        assert_eq!(reply.slot("date"), None);
        assert_eq!(reply.slot("origin"), None);
        assert_eq!(reply.slot("destination"), None);
    }

    #[test]
    fn test_reply_fields_default() {
        let reply: NluReply = serde_json::from_str("{}").expect("reply decodes");
        assert!(reply.fulfillment_text.is_empty());
        assert!(reply.parameters.is_empty());
    }

    #[test]
    fn test_fallback_reply() {
        let reply = NluReply::fallback();
        assert_eq!(reply.fulfillment_text, FALLBACK_FULFILLMENT);
        assert!(reply.parameters.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let client = NluClient::new("http://127.0.0.1:1/detect", "en");
        let reply = client.detect_intent("s1", "hello").await;
        assert_eq!(reply.fulfillment_text, FALLBACK_FULFILLMENT);
        assert!(reply.parameters.is_empty());
    }
}
