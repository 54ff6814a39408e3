use std::sync::OnceLock;

use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;

use crate::error::AgentError;
use crate::otel;

pub fn inc_chat_request() {
    chat_requests().add(1, &[])
}

pub fn inc_chat_error(error: &AgentError) {
    let kind = match error {
        AgentError::FlightSearch(_) => "FlightSearch",
        AgentError::Generation(_) => "Generation",
    };
    chat_errors().add(1, &[KeyValue::new("kind", kind)])
}

pub fn inc_flight_search_success() {
    flight_search_success().add(1, &[])
}

pub fn inc_flight_search_error(kind: &'static str) {
    flight_search_error().add(1, &[KeyValue::new("kind", kind)])
}

fn chat_requests() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        otel::meter()
            .u64_counter("chat_requests")
            .with_description("Number of chatbot queries received")
            .build()
    })
}

fn chat_errors() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        otel::meter()
            .u64_counter("chat_errors")
            .with_description("Number of chatbot queries that failed")
            .build()
    })
}

fn flight_search_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        otel::meter()
            .u64_counter("flight_search_success")
            .with_description("Number of flight searches that returned offers")
            .build()
    })
}

fn flight_search_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        otel::meter()
            .u64_counter("flight_search_error")
            .with_description("Number of flight searches that did not return offers")
            .build()
    })
}
