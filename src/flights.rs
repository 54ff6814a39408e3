//! Amadeus flight-offers client.
//!
//! OAuth2 client-credentials token exchange followed by a bearer-authorized
//! flight-offers search. Upstream failures come back as tagged
//! [`SearchOutcome`] values; only a failed token exchange is an `Err`, which
//! aborts the enclosing search.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::cities;
use crate::config::AmadeusConfig;
use crate::error::FlightSearchError;
use crate::metrics;

const UPSTREAM_FAILED_REPLY: &str = "Could not retrieve flight offers from Amadeus API.";

/// Result of a flight search. `Offers` wraps the raw upstream JSON body;
/// the error variants carry the user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Offers(Value),
    NoFlights,
    InvalidLocation,
    Upstream(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct FlightClient {
    http: reqwest::Client,
    token_url: String,
    search_url: String,
    api_key: String,
    api_secret: String,
    currency: String,
    max_offers: u32,
}

impl FlightClient {
    pub fn new(config: &AmadeusConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: config.token_url.clone(),
            search_url: config.search_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            currency: config.currency.clone(),
            max_offers: config.max_offers,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_access_token(&self) -> Result<String, FlightSearchError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(FlightSearchError::MissingCredentials);
        }
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.api_key.as_str()),
            ("client_secret", self.api_secret.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| FlightSearchError::TokenExchange(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlightSearchError::TokenExchange(format!("status {status}")));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FlightSearchError::TokenExchange(e.to_string()))?;
        debug!("obtained access token");
        Ok(token.access_token)
    }

    /// Search flight offers for a route and date.
    ///
    /// Cities are resolved to location codes first, so an unknown city never
    /// costs a network round-trip.
    #[instrument(skip(self))]
    pub async fn search_cheapest(
        &self,
        origin: &str,
        destination: &str,
        date: &str,
    ) -> Result<SearchOutcome, FlightSearchError> {
        let (Some(origin_code), Some(destination_code)) =
            (cities::code_for(origin), cities::code_for(destination))
        else {
            metrics::inc_flight_search_error("invalid_location");
            return Ok(SearchOutcome::InvalidLocation);
        };

        // Timestamps occasionally arrive as full datetimes; keep the date part.
        let departure_date = date.split('T').next().unwrap_or(date);

        let token = self.fetch_access_token().await?;

        let max_offers = self.max_offers.to_string();
        let query = [
            ("originLocationCode", origin_code),
            ("destinationLocationCode", destination_code),
            ("departureDate", departure_date),
            ("adults", "1"),
            ("currencyCode", self.currency.as_str()),
            ("max", max_offers.as_str()),
        ];
        info!(origin_code, destination_code, departure_date, "searching flight offers");

        let response = match self
            .http
            .get(&self.search_url)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "flight offers request failed");
                metrics::inc_flight_search_error("upstream");
                return Ok(SearchOutcome::Upstream(UPSTREAM_FAILED_REPLY.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "failed to read flight offers response");
                metrics::inc_flight_search_error("upstream");
                return Ok(SearchOutcome::Upstream(UPSTREAM_FAILED_REPLY.to_string()));
            }
        };
        if !status.is_success() {
            error!(%status, body = %body, "flight offers call failed");
            metrics::inc_flight_search_error("upstream");
            return Ok(SearchOutcome::Upstream(UPSTREAM_FAILED_REPLY.to_string()));
        }

        let payload: Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "flight offers response was not JSON");
                metrics::inc_flight_search_error("upstream");
                return Ok(SearchOutcome::Upstream(UPSTREAM_FAILED_REPLY.to_string()));
            }
        };

        let outcome = classify_offers(payload);
        match &outcome {
            SearchOutcome::Offers(_) => metrics::inc_flight_search_success(),
            SearchOutcome::NoFlights => metrics::inc_flight_search_error("no_flights"),
            _ => {}
        }
        Ok(outcome)
    }
}

/// A payload with a non-empty `data` array is a hit; anything else means no
/// flights. No further schema validation happens here.
fn classify_offers(payload: Value) -> SearchOutcome {
    match payload.get("data").and_then(|data| data.as_array()) {
        Some(offers) if !offers.is_empty() => SearchOutcome::Offers(payload),
        _ => SearchOutcome::NoFlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> FlightClient {
        // URLs point nowhere; the tests below never reach the network.
        FlightClient::new(&AmadeusConfig {
            api_key: String::new(),
            api_secret: String::new(),
            token_url: "http://127.0.0.1:1/token".into(),
            search_url: "http://127.0.0.1:1/search".into(),
            currency: "USD".into(),
            max_offers: 5,
        })
    }

    #[tokio::test]
    async fn test_unknown_origin_is_invalid_location_without_network() {
        let outcome = client()
            .search_cheapest("Atlantis", "London", "2025-03-01")
            .await
            .expect("no token exchange should happen");
        assert_eq!(outcome, SearchOutcome::InvalidLocation);
    }

    #[tokio::test]
    async fn test_unknown_destination_is_invalid_location_without_network() {
        let outcome = client()
            .search_cheapest("London", "Atlantis", "2025-03-01")
            .await
            .expect("no token exchange should happen");
        assert_eq!(outcome, SearchOutcome::InvalidLocation);
    }

    #[tokio::test]
    async fn test_token_exchange_failure_surfaces_auth_error() {
        // Credentials are set but the token endpoint is unreachable, so the
        // exchange fails and the search endpoint is never contacted.
        let client = FlightClient::new(&AmadeusConfig {
            api_key: "key".into(),
            api_secret: "secret".into(),
            token_url: "http://127.0.0.1:1/token".into(),
            search_url: "http://127.0.0.1:1/search".into(),
            currency: "USD".into(),
            max_offers: 5,
        });
        let result = client.search_cheapest("Tokyo", "London", "2025-03-01").await;
        assert!(matches!(result, Err(FlightSearchError::TokenExchange(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials_abort_before_search() {
        // Both cities resolve, so the token exchange runs and fails fast on
        // empty credentials.
        let result = client().search_cheapest("Tokyo", "London", "2025-03-01").await;
        assert!(matches!(result, Err(FlightSearchError::MissingCredentials)));
    }

    #[test]
    fn test_classify_offers_non_empty() {
        let payload = json!({"data": [{"id": "1"}]});
        match classify_offers(payload.clone()) {
            SearchOutcome::Offers(value) => assert_eq!(value, payload),
            other => panic!("expected offers, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_offers_empty_array_is_no_flights() {
        assert_eq!(classify_offers(json!({"data": []})), SearchOutcome::NoFlights);
    }

    #[test]
    fn test_classify_offers_missing_data_is_no_flights() {
        assert_eq!(classify_offers(json!({"meta": {}})), SearchOutcome::NoFlights);
    }

    #[test]
    fn test_classify_offers_non_array_data_is_no_flights() {
        assert_eq!(classify_offers(json!({"data": "oops"})), SearchOutcome::NoFlights);
    }
}
