//! # Canned claims
//!
//! Static table of pre-authored verdicts keyed by lowercase claim fragments.
//! A claim matches an entry when the entry's key is a substring of the lowercased claim.
//!
//! Lookup order is fixed at load time: longest key first, ties broken
//! lexicographically. A claim containing both "vaccines" and "covid vaccines cause
//! infertility" therefore resolves to the more specific entry regardless of file order.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::verdict::{lenient_opt_number, EvidenceItem, Signals};

/// One pre-built verdict. Every field is optional; see `verdict::from_canned` for defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CannedEntry {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub signals: Option<Signals>,
    #[serde(default)]
    pub education_tip: Option<String>,
}

/// Read-only lookup table, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CannedTable {
    /// Sorted by (key length desc, key asc).
    entries: Vec<(String, CannedEntry)>,
}

impl CannedTable {
    /// Build from (fragment, entry) pairs. Keys are trimmed and lowercased; empty keys
    /// are dropped; on duplicate keys the last one wins.
    pub fn new<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, CannedEntry)>,
        K: AsRef<str>,
    {
        let mut by_key: HashMap<String, CannedEntry> = HashMap::new();
        for (k, v) in pairs {
            let key = k.as_ref().trim().to_lowercase();
            if !key.is_empty() {
                by_key.insert(key, v);
            }
        }
        let mut entries: Vec<(String, CannedEntry)> = by_key.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { entries }
    }

    /// Parse a JSON object `{ "<fragment>": { ...entry... }, ... }`.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: HashMap<String, CannedEntry> =
            serde_json::from_str(s).context("parsing canned claims json")?;
        Ok(Self::new(raw))
    }

    /// Load the table from disk. A missing or unparsable file is an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("canned claims file not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading canned claims from {}", path.display()))?;
        let table = Self::from_json_str(&content)
            .with_context(|| format!("loading canned claims from {}", path.display()))?;
        info!(path = %path.display(), entries = table.len(), "canned claims loaded");
        Ok(table)
    }

    /// First entry (in lookup order) whose key occurs in the lowercased claim.
    pub fn lookup(&self, claim: &str) -> Option<(&str, &CannedEntry)> {
        let needle = claim.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(k, _)| needle.contains(k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(verdict: &str) -> CannedEntry {
        CannedEntry {
            verdict: Some(verdict.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let t = CannedTable::new([("Earth is flat", entry("Likely False"))]);
        let (key, hit) = t.lookup("The EARTH is flat, right?").unwrap();
        assert_eq!(key, "earth is flat");
        assert_eq!(hit.verdict.as_deref(), Some("Likely False"));
        assert!(t.lookup("the earth is round").is_none());
    }

    #[test]
    fn longest_key_wins() {
        let t = CannedTable::new([
            ("vaccines", entry("Generic")),
            ("covid vaccines cause infertility", entry("Likely False")),
        ]);
        let (_, hit) = t.lookup("Do covid vaccines cause infertility?").unwrap();
        assert_eq!(hit.verdict.as_deref(), Some("Likely False"));
    }

    #[test]
    fn equal_length_ties_are_lexicographic() {
        let t = CannedTable::new([("bbb", entry("B")), ("aaa", entry("A"))]);
        let keys: Vec<_> = t.keys().collect();
        assert_eq!(keys, vec!["aaa", "bbb"]);
        let (_, hit) = t.lookup("bbb aaa").unwrap();
        assert_eq!(hit.verdict.as_deref(), Some("A"));
    }

    #[test]
    fn empty_claim_and_empty_keys_never_match() {
        let t = CannedTable::new([("", entry("X")), ("  ", entry("Y"))]);
        assert!(t.is_empty());
        let t = CannedTable::new([("flat", entry("X"))]);
        assert!(t.lookup("   ").is_none());
    }

    #[test]
    fn json_with_loose_confidence() {
        let t = CannedTable::from_json_str(
            r#"{
                "earth is flat": { "verdict": "Likely False", "confidence": "0.97" },
                "moon is cheese": { "verdict": "Likely False", "confidence": 1 }
            }"#,
        )
        .unwrap();
        let (_, flat) = t.lookup("the earth is flat").unwrap();
        assert_eq!(flat.confidence, Some(0.97));
        let (_, moon) = t.lookup("the moon is cheese").unwrap();
        assert_eq!(moon.confidence, Some(1.0));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(CannedTable::from_json_str("[1,2,3]").is_err());
        assert!(CannedTable::from_json_str("not json").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = CannedTable::load_from_file("no/such/canned.json").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
