// src/providers/mock.rs
//! Deterministic stand-ins for tests and `AI_TEST_MODE=mock` runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::genai::TextModel;
use super::{SearchHit, SearchProvider};

/// Search provider returning a fixed hit list. Counts calls.
#[derive(Debug, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
        }
    }

    /// Three hits from trusted fact-checking domains.
    pub fn fixture() -> Self {
        Self::new(vec![
            SearchHit {
                title: "Fact check".into(),
                snippet: "Fact-checkers found no evidence supporting the claim.".into(),
                link: "https://www.factcheck.org/mock".into(),
                domain: "www.factcheck.org".into(),
            },
            SearchHit {
                title: "Reuters".into(),
                snippet: "Reuters reviewed the claim against official records.".into(),
                link: "https://www.reuters.com/mock".into(),
                domain: "www.reuters.com".into(),
            },
            SearchHit {
                title: "Snopes".into(),
                snippet: "Snopes rates the claim as unproven.".into(),
                link: "https://www.snopes.com/mock".into(),
                domain: "www.snopes.com".into(),
            },
        ])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, limit: usize) -> Vec<SearchHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hits.iter().take(limit).cloned().collect()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Text model with canned replies: classification prompts get `stance_reply`,
/// everything else gets `verdict_reply`. Counts calls.
#[derive(Debug)]
pub struct MockModel {
    pub stance_reply: String,
    pub verdict_reply: String,
    calls: AtomicUsize,
}

impl MockModel {
    pub fn new(stance_reply: impl Into<String>, verdict_reply: impl Into<String>) -> Self {
        Self {
            stance_reply: stance_reply.into(),
            verdict_reply: verdict_reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new(
            r#"{"stance":"REFUTE","confidence":0.8,"reason":"Mock reviewer found contrary evidence."}"#,
            r#"{"verdict":"Likely False","confidence":0.7,"tip":"Check official sources (mock)."}"#,
        )
    }
}

#[async_trait]
impl TextModel for MockModel {
    async fn generate_text(&self, prompt: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("Snippet:") {
            Some(self.stance_reply.clone())
        } else {
            Some(self.verdict_reply.clone())
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
