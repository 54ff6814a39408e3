//! Static intent-pattern dataset.
//!
//! Loaded once at startup from a JSON file of `{intent, input, response}`
//! entries, where `input` holds regex patterns. Matching walks entries in
//! file order and returns the first entry whose pattern hits; patterns and
//! query are both lowercased.

use std::fs;

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    intent: String,
    input: OneOrMany,
    response: OneOrMany,
}

pub struct IntentEntry {
    pub intent: String,
    patterns: Vec<Regex>,
    pub response: String,
}

pub struct IntentCatalog {
    entries: Vec<IntentEntry>,
}

impl IntentCatalog {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let raw_entries: Vec<RawEntry> =
            serde_json::from_str(raw).context("parsing intent dataset")?;
        let mut entries = Vec::with_capacity(raw_entries.len());
        for raw_entry in raw_entries {
            let patterns = raw_entry
                .input
                .into_vec()
                .into_iter()
                .map(|pattern| {
                    Regex::new(&pattern.to_lowercase())
                        .with_context(|| format!("intent {}: bad pattern {pattern}", raw_entry.intent))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let response = raw_entry
                .response
                .into_vec()
                .into_iter()
                .next()
                .unwrap_or_default();
            entries.push(IntentEntry {
                intent: raw_entry.intent,
                patterns,
                response,
            });
        }
        Ok(Self { entries })
    }

    /// First entry whose pattern matches the lowercased query, in file order.
    pub fn match_intent(&self, query: &str) -> Option<&IntentEntry> {
        let lower = query.to_lowercase();
        for entry in &self.entries {
            if entry.patterns.iter().any(|re| re.is_match(&lower)) {
                debug!(intent = %entry.intent, "matched intent pattern");
                return Some(entry);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
