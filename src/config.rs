//! Environment-backed configuration.
//!
//! Every setting has a default so the process always starts; validation only
//! warns. Amadeus credentials default to placeholder strings and must come
//! from the environment for real searches.

use std::env;
use std::str::FromStr;

use tracing::warn;

const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_AMADEUS_API_KEY";
const PLACEHOLDER_API_SECRET: &str = "PLACEHOLDER_AMADEUS_API_SECRET";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub allowed_origin: String,
    pub amadeus: AmadeusConfig,
    pub session: SessionConfig,
    pub nlu_endpoint: Option<String>,
    pub nlu_language: String,
    pub completion_model: String,
    pub dataset_path: String,
}

#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    pub api_key: String,
    pub api_secret: String,
    pub token_url: String,
    pub search_url: String,
    pub currency: String,
    pub max_offers: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Config {
    /// Collect configuration from the environment. Always returns a config;
    /// problems are logged, not fatal.
    pub fn load() -> Self {
        let config = Self {
            bind_addr: env_or("CHATBOT_BIND", "127.0.0.1:5000"),
            allowed_origin: env_or("CHATBOT_ALLOWED_ORIGIN", "http://localhost:4000"),
            amadeus: AmadeusConfig {
                api_key: env_or("AMADEUS_API_KEY", PLACEHOLDER_API_KEY),
                api_secret: env_or("AMADEUS_API_SECRET", PLACEHOLDER_API_SECRET),
                token_url: env_or(
                    "AMADEUS_TOKEN_URL",
                    "https://test.api.amadeus.com/v1/security/oauth2/token",
                ),
                search_url: env_or(
                    "AMADEUS_SEARCH_URL",
                    "https://test.api.amadeus.com/v2/shopping/flight-offers",
                ),
                currency: env_or("FLIGHT_CURRENCY", "USD"),
                max_offers: env_parse("FLIGHT_MAX_OFFERS", 5),
            },
            session: SessionConfig {
                idle_ttl_secs: env_parse("SESSION_IDLE_TTL_SECS", 1800),
                max_sessions: env_parse("SESSION_MAX_SESSIONS", 1024),
            },
            nlu_endpoint: env::var("NLU_ENDPOINT").ok().filter(|v| !v.is_empty()),
            nlu_language: env_or("NLU_LANGUAGE", "en"),
            completion_model: env_or("COMPLETION_MODEL", "gpt-4.1"),
            dataset_path: env_or("TRAVEL_DATASET_PATH", "data/travel_dataset.json"),
        };
        config.validate();
        config
    }

    fn validate(&self) {
        if self.amadeus.api_key == PLACEHOLDER_API_KEY
            || self.amadeus.api_secret == PLACEHOLDER_API_SECRET
        {
            warn!("AMADEUS_API_KEY/AMADEUS_API_SECRET not set; flight searches will fail");
        }
        if self.amadeus.max_offers == 0 {
            warn!("FLIGHT_MAX_OFFERS is 0; searches will return empty pages");
        }
        if self.session.max_sessions == 0 {
            warn!("SESSION_MAX_SESSIONS is 0; treating it as 1");
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, raw = %raw, "unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("DEFINITELY_UNSET_VAR_XYZ", "fallback"), "fallback");
    }

    #[test]
    fn test_env_parse_default() {
        assert_eq!(env_parse("DEFINITELY_UNSET_VAR_XYZ", 42u32), 42);
    }

    #[test]
    fn test_load_has_sane_defaults() {
        let config = Config::load();
        assert!(config.amadeus.token_url.contains("oauth2/token"));
        assert!(config.amadeus.search_url.contains("flight-offers"));
        assert!(!config.nlu_language.is_empty());
    }
}
