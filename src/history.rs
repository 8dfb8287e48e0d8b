//! Bounded on-disk log of previously delivered facts.
//!
//! The log lives in a small JSON document (`{"facts": [...]}`) that is read
//! fully and rewritten fully on every append. Only the most recent 200 facts
//! are kept; older entries are evicted on write.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HISTORY_CAP: usize = 200;

#[derive(Serialize, Deserialize, Default)]
struct HistoryFile {
    facts: Vec<String>,
}

pub struct FactHistory {
    path: PathBuf,
    facts: Vec<String>,
}

impl FactHistory {
    /// Load history from `path`, creating an empty file if none exists.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let history = Self {
                path,
                facts: Vec::new(),
            };
            history.save()?;
            return Ok(history);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let file: HistoryFile = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;

        Ok(Self {
            path,
            facts: file.facts,
        })
    }

    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    pub fn contains(&self, fact: &str) -> bool {
        self.facts.iter().any(|f| f == fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Append a fact, evict anything past the cap (oldest first), and rewrite
    /// the whole document.
    pub fn push(&mut self, fact: String) -> Result<(), String> {
        self.facts.push(fact);
        if self.facts.len() > HISTORY_CAP {
            let excess = self.facts.len() - HISTORY_CAP;
            self.facts.drain(..excess);
        }
        self.save()
    }

    fn save(&self) -> Result<(), String> {
        let file = HistoryFile {
            facts: self.facts.clone(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to serialize fact history: {e}"))?;
        std::fs::write(&self.path, content)
            .map_err(|e| format!("Failed to write {}: {e}", self.path.display()))
    }
}
