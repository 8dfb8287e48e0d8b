//! Fact acquisition: prompt construction, provider calls, verification and
//! retry.
//!
//! The engine shields callers from the unreliability of the generative
//! provider. Four historically divergent verification strategies exist and
//! all remain legitimate for different product needs, so the active one is
//! selected explicitly via [`FactMode`] rather than hard-coded.

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::args::FictionArgs;
use crate::history::FactHistory;
use crate::prompts;

/// Generative text provider, treated as a fallible black box.
#[async_trait]
pub trait Provider: Send + Sync {
    /// One chat-completion request. `wants_json` asks the provider for a
    /// JSON-typed response (structured batch generation).
    async fn complete(&self, prompt: &str, wants_json: bool) -> Result<String, String>;
}

/// Existence probe for candidate URLs. A network failure counts as a dead
/// link, indistinguishable from a genuine 404.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn link_ok(&self, url: &str) -> bool;
}

/// Which verification strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactMode {
    /// Duplicate-avoidance against the persisted history.
    Unique,
    /// No verification, raw provider text.
    Quick,
    /// Structured batch of ten candidates, shuffled, links probed in order.
    SourcedBatch,
    /// Single fact with an embedded link, regenerated up to 5 times.
    SourcedSingle,
}

impl FromStr for FactMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unique" => Ok(Self::Unique),
            "quick" => Ok(Self::Quick),
            "sourced-batch" => Ok(Self::SourcedBatch),
            "sourced-single" => Ok(Self::SourcedSingle),
            other => Err(format!(
                "unknown mode '{other}' (expected unique, quick, sourced-batch or sourced-single)"
            )),
        }
    }
}

/// Upper bound on regeneration when the provider keeps repeating known facts.
pub const MAX_UNIQUE_ATTEMPTS: usize = 5;
/// Upper bound on regeneration when no link verifies in single-fact mode.
pub const MAX_SOURCED_ATTEMPTS: usize = 5;

#[derive(Debug)]
pub enum FactError {
    /// The provider call itself failed (network or API error).
    Provider(String),
    /// The structured batch response was not the JSON shape we asked for.
    BadBatch(String),
    /// Every attempt produced a fact already present in the history.
    NoUniqueFact,
    /// No candidate in the batch had a working link.
    NoVerifiedLink,
}

impl fmt::Display for FactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactError::Provider(e) => write!(f, "provider error: {e}"),
            FactError::BadBatch(e) => write!(f, "malformed fact batch: {e}"),
            FactError::NoUniqueFact => write!(
                f,
                "provider kept repeating known facts after {MAX_UNIQUE_ATTEMPTS} attempts"
            ),
            FactError::NoVerifiedLink => write!(f, "no verifiable fact found in batch"),
        }
    }
}

impl std::error::Error for FactError {}

/// One fact from a structured batch, pending link verification.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub fact: String,
    pub url: String,
}

#[derive(Deserialize)]
struct BatchResponse {
    facts: Vec<Candidate>,
}

pub struct FactEngine<P, L> {
    provider: P,
    links: L,
    mode: FactMode,
    // Guards the read-modify-write on the history so a concurrent broadcast
    // and command cannot interleave between read and persist.
    history: Mutex<FactHistory>,
}

impl<P: Provider, L: LinkChecker> FactEngine<P, L> {
    pub fn new(provider: P, links: L, mode: FactMode, history: FactHistory) -> Self {
        Self {
            provider,
            links,
            mode,
            history: Mutex::new(history),
        }
    }

    /// Produce one ready-to-send fact using the configured mode.
    pub async fn fetch_fact(&self, topic: Option<&str>) -> Result<String, FactError> {
        match self.mode {
            FactMode::Unique => self.fetch_unique(topic).await,
            FactMode::Quick => self.fetch_quick(topic).await,
            FactMode::SourcedBatch => self.fetch_sourced_batch(topic).await,
            FactMode::SourcedSingle => self.fetch_sourced_single(topic).await,
        }
    }

    /// Produce one invented "fact". Always unverified: no retry, no history,
    /// no link checking.
    pub async fn fetch_fiction(&self, args: &FictionArgs) -> Result<String, FactError> {
        let prompt = prompts::fiction_prompt(
            args.get("topic").map(String::as_str),
            args.get("author").map(String::as_str),
        );
        let text = self
            .provider
            .complete(&prompt, false)
            .await
            .map_err(FactError::Provider)?;
        Ok(text.trim().to_string())
    }

    async fn fetch_unique(&self, topic: Option<&str>) -> Result<String, FactError> {
        let mut history = self.history.lock().await;

        for attempt in 1..=MAX_UNIQUE_ATTEMPTS {
            let prompt = prompts::unique_fact_prompt(topic, history.facts());
            let fact = self
                .provider
                .complete(&prompt, false)
                .await
                .map_err(FactError::Provider)?
                .trim()
                .to_string();

            if !history.contains(&fact) {
                if let Err(e) = history.push(fact.clone()) {
                    // Delivery matters more than dedup bookkeeping.
                    warn!("Failed to persist fact history: {e}");
                }
                return Ok(fact);
            }
            info!("Provider repeated a known fact (attempt {attempt}), retrying");
        }

        Err(FactError::NoUniqueFact)
    }

    async fn fetch_quick(&self, topic: Option<&str>) -> Result<String, FactError> {
        // ThreadRng is not Send, keep it out of the await.
        let prompt = {
            let mut rng = rand::thread_rng();
            let flavor = prompts::diversify(&mut rng, topic);
            let out_of = if rng.gen_bool(0.5) { 5 } else { 10 };
            let pick = rng.gen_range(1..=out_of);
            prompts::quick_fact_prompt(&flavor, pick, out_of)
        };

        let text = self
            .provider
            .complete(&prompt, false)
            .await
            .map_err(FactError::Provider)?;
        Ok(text.trim().to_string())
    }

    async fn fetch_sourced_batch(&self, topic: Option<&str>) -> Result<String, FactError> {
        let prompt = {
            let mut rng = rand::thread_rng();
            prompts::batch_fact_prompt(&prompts::diversify(&mut rng, topic))
        };

        let raw = self
            .provider
            .complete(&prompt, true)
            .await
            .map_err(FactError::Provider)?;
        let batch: BatchResponse =
            serde_json::from_str(&raw).map_err(|e| FactError::BadBatch(e.to_string()))?;

        let mut candidates = batch.facts;
        candidates.shuffle(&mut rand::thread_rng());

        for candidate in &candidates {
            if self.links.link_ok(&candidate.url).await {
                return Ok(format!(
                    "{}\n\n{}",
                    candidate.fact.trim(),
                    candidate.url.trim()
                ));
            }
            info!("Link check failed for {}", candidate.url);
        }

        Err(FactError::NoVerifiedLink)
    }

    async fn fetch_sourced_single(&self, topic: Option<&str>) -> Result<String, FactError> {
        let mut last = String::new();

        for attempt in 1..=MAX_SOURCED_ATTEMPTS {
            let prompt = {
                let mut rng = rand::thread_rng();
                prompts::sourced_fact_prompt(&prompts::diversify(&mut rng, topic))
            };

            let text = self
                .provider
                .complete(&prompt, false)
                .await
                .map_err(FactError::Provider)?
                .trim()
                .to_string();

            match first_url(&text) {
                Some(url) if self.links.link_ok(&url).await => return Ok(text),
                Some(url) => info!("Attempt {attempt}: link {url} did not verify"),
                None => info!("Attempt {attempt}: no link in response"),
            }
            last = text;
        }

        // Best-effort degrade: an unverified fact beats silence.
        warn!("No attempt produced a verifiable link, returning last response as-is");
        Ok(last)
    }
}

/// First URL-shaped substring in the text, if any.
fn first_url(text: &str) -> Option<String> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = URL_RE.get_or_init(|| Regex::new(r"https?://[^\s)>\]]+").unwrap());
    re.find(text).map(|m| m.as_str().to_string())
}
