//! # Source Reliability
//!
//! Maps an evidence domain to a reliability value in `[0.0, 1.0]`:
//!
//! - `0.9`  if the domain contains any trusted fragment (case-insensitive substring)
//! - `0.4`  if the domain is empty
//! - `0.45` otherwise
//!
//! The trusted list is loaded once at startup from TOML (`trusted = [...]`) and falls
//! back to a built-in seed when the file is absent or unreadable.

use serde::Deserialize;
use std::{fs, path::Path};
use tracing::{info, warn};

pub const TRUSTED_RELIABILITY: f64 = 0.9;
pub const UNKNOWN_RELIABILITY: f64 = 0.45;
pub const MISSING_RELIABILITY: f64 = 0.4;

/// Built-in trusted fragments.
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "who.int",
    "cdc.gov",
    "reuters.com",
    "bbc.co.uk",
    "bbc.com",
    "thehindu.com",
    "nasa.gov",
    "pubmed.ncbi.nlm.nih.gov",
    "factcheck.org",
    "politifact.com",
    "snopes.com",
];

#[derive(Debug, Deserialize)]
struct TrustedFile {
    #[serde(default)]
    trusted: Vec<String>,
}

/// Immutable trusted-domain list, shared read-only across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReliability {
    trusted: Vec<String>,
}

impl Default for SourceReliability {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_DOMAINS.iter().copied())
    }
}

impl SourceReliability {
    /// Build from arbitrary fragments; trims, lowercases and drops empties/duplicates.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trusted: Vec<String> = Vec::new();
        for f in fragments {
            let f = f.as_ref().trim().to_ascii_lowercase();
            if !f.is_empty() && !trusted.contains(&f) {
                trusted.push(f);
            }
        }
        Self { trusted }
    }

    /// Parse a TOML document of the form `trusted = ["who.int", ...]`.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let parsed: TrustedFile = toml::from_str(s)?;
        Ok(Self::new(parsed.trusted))
    }

    /// Load from a TOML file. Falls back to the built-in seed on any error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|s| Self::from_toml_str(&s));
        match loaded {
            Ok(cfg) if !cfg.trusted.is_empty() => {
                info!(path = %path.display(), count = cfg.trusted.len(), "trusted domains loaded");
                cfg
            }
            Ok(_) => {
                warn!(path = %path.display(), "trusted domain list is empty; using built-in seed");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "trusted domains unavailable; using built-in seed");
                Self::default()
            }
        }
    }

    pub fn trusted(&self) -> &[String] {
        &self.trusted
    }

    /// Per-item reliability for a domain.
    pub fn score(&self, domain: &str) -> f64 {
        let d = domain.trim().to_ascii_lowercase();
        if d.is_empty() {
            return MISSING_RELIABILITY;
        }
        if self.trusted.iter().any(|t| d.contains(t.as_str())) {
            TRUSTED_RELIABILITY
        } else {
            UNKNOWN_RELIABILITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_substring_match() {
        let r = SourceReliability::default();
        assert_eq!(r.score("www.cdc.gov"), TRUSTED_RELIABILITY);
        assert_eq!(r.score("cdc.gov"), TRUSTED_RELIABILITY);
        assert_eq!(r.score("news.bbc.co.uk"), TRUSTED_RELIABILITY);
    }

    #[test]
    fn case_insensitive_lookup() {
        let r = SourceReliability::default();
        assert_eq!(r.score("WWW.WHO.INT"), TRUSTED_RELIABILITY);
    }

    #[test]
    fn missing_and_unknown_domains() {
        let r = SourceReliability::default();
        assert_eq!(r.score(""), MISSING_RELIABILITY);
        assert_eq!(r.score("   "), MISSING_RELIABILITY);
        assert_eq!(r.score("example-blog.net"), UNKNOWN_RELIABILITY);
    }

    #[test]
    fn toml_list_replaces_seed() {
        let r = SourceReliability::from_toml_str(r#"trusted = [" Example.org ", "", "example.org"]"#)
            .unwrap();
        assert_eq!(r.trusted(), &["example.org".to_string()]);
        assert_eq!(r.score("docs.example.org"), TRUSTED_RELIABILITY);
        assert_eq!(r.score("who.int"), UNKNOWN_RELIABILITY);
    }

    #[test]
    fn missing_file_uses_seed() {
        let r = SourceReliability::load_from_file("definitely/not/here.toml");
        assert_eq!(r, SourceReliability::default());
    }
}
