use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlightSearchError {
    #[error("Could not obtain access token from Amadeus API: {0}")]
    TokenExchange(String),
    #[error("Missing Amadeus API credentials")]
    MissingCredentials,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    FlightSearch(#[from] FlightSearchError),
    #[error("Reply generation failed: {0}")]
    Generation(String),
}
