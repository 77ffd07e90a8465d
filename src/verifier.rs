//! # Verifier
//! Request orchestration for `verify(claim, is_page)`:
//!
//! 1. reject blank claims
//! 2. canned lookup → canned response
//! 3. live search → zero hits → fixed uncertain response
//! 4. classify each hit, aggregate, generate a verdict, assemble the response
//!
//! Collaborator failures only ever shrink the evidence; nothing here returns an
//! error except the blank-claim rejection.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::canned::CannedTable;
use crate::config::settings::DEFAULT_SEARCH_LIMIT;
use crate::logging::claim_id;
use crate::providers::{Collaborators, SearchHit, SearchProvider, StanceClassifier, VerdictGenerator};
use crate::scoring::{aggregate, SourceReliability};
use crate::text::search_query;
use crate::verdict::{self, EvidenceItem, VerdictResponse};

/// Client input errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    EmptyClaim,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::EmptyClaim => f.write_str("Claim is empty"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Which branch produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Canned,
    Live,
    Fallback,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Canned => "canned",
            Resolution::Live => "live",
            Resolution::Fallback => "fallback",
        }
    }
}

/// Immutable tables plus the collaborators. Shared across requests behind an `Arc`.
pub struct Verifier {
    canned: Arc<CannedTable>,
    reliability: Arc<SourceReliability>,
    search: Arc<dyn SearchProvider>,
    classifier: Arc<dyn StanceClassifier>,
    generator: Arc<dyn VerdictGenerator>,
    search_limit: usize,
}

impl Verifier {
    pub fn new(
        canned: Arc<CannedTable>,
        reliability: Arc<SourceReliability>,
        collaborators: Collaborators,
    ) -> Self {
        ensure_metrics_described();
        Self {
            canned,
            reliability,
            search: collaborators.search,
            classifier: collaborators.classifier,
            generator: collaborators.generator,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    /// Verify a claim.
    pub async fn verify(&self, claim: &str, is_page: bool) -> Result<VerdictResponse, VerifyError> {
        self.verify_traced(claim, is_page).await.map(|(resp, _)| resp)
    }

    /// Verify a claim and report which branch answered.
    pub async fn verify_traced(
        &self,
        claim: &str,
        is_page: bool,
    ) -> Result<(VerdictResponse, Resolution), VerifyError> {
        let claim = claim.trim();
        if claim.is_empty() {
            counter!("verify_rejected_total").increment(1);
            return Err(VerifyError::EmptyClaim);
        }
        counter!("verify_requests_total").increment(1);

        let t0 = Instant::now();
        let id = claim_id(claim);

        let (resp, path) = if let Some((key, entry)) = self.canned.lookup(claim) {
            counter!("verify_canned_hits_total").increment(1);
            info!(%id, canned_key = key, "canned match");
            (verdict::from_canned(entry), Resolution::Canned)
        } else {
            self.verify_live(claim, is_page, &id).await
        };

        histogram!("verify_latency_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        info!(
            %id,
            path = path.as_str(),
            verdict = %resp.verdict,
            confidence = resp.confidence,
            evidence = resp.evidence.len(),
            "claim verified"
        );
        Ok((resp, path))
    }

    async fn verify_live(&self, claim: &str, is_page: bool, id: &str) -> (VerdictResponse, Resolution) {
        let query = search_query(claim, is_page);
        let hits = self.search.search(&query, self.search_limit).await;
        if hits.is_empty() {
            counter!("verify_fallback_total").increment(1);
            info!(%id, search = self.search.name(), "no evidence retrieved; uncertain fallback");
            return (verdict::uncertain_fallback(), Resolution::Fallback);
        }
        counter!("verify_live_total").increment(1);

        let mut evidence = Vec::with_capacity(hits.len());
        for hit in hits {
            evidence.push(self.judge(claim, hit).await);
        }

        let aggregation = aggregate(&evidence, &self.reliability);
        let summary = evidence_summary(&evidence);
        let generated = self.generator.generate(claim, &summary).await;

        (verdict::assemble(evidence, &aggregation, generated), Resolution::Live)
    }

    async fn judge(&self, claim: &str, hit: SearchHit) -> EvidenceItem {
        let text = if hit.snippet.trim().is_empty() {
            hit.title
        } else {
            hit.snippet
        };
        let judgement = self.classifier.classify(claim, &text).await;
        EvidenceItem {
            text,
            link: hit.link,
            domain: hit.domain,
            stance: judgement.stance,
            stance_confidence: Some(verdict::clamp01(judgement.confidence)),
            reason: judgement.reason,
        }
    }
}

/// One line per item: `- [STANCE conf] domain: reason`.
pub fn evidence_summary(items: &[EvidenceItem]) -> String {
    items
        .iter()
        .map(|e| {
            let domain = if e.domain.is_empty() { "unknown" } else { e.domain.as_str() };
            format!(
                "- [{} {:.2}] {}: {}",
                e.stance.as_str(),
                e.confidence(),
                domain,
                e.reason.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("verify_requests_total", "Accepted /verify requests.");
        describe_counter!("verify_rejected_total", "Requests rejected for a blank claim.");
        describe_counter!("verify_canned_hits_total", "Claims answered from the canned table.");
        describe_counter!("verify_live_total", "Claims answered from live evidence.");
        describe_counter!(
            "verify_fallback_total",
            "Claims with no canned match and no retrieved evidence."
        );
        describe_histogram!("verify_latency_ms", "End-to-end verify latency in milliseconds.");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Stance;

    #[test]
    fn summary_lines() {
        let items = vec![
            EvidenceItem {
                text: "t".into(),
                link: "l".into(),
                domain: "who.int".into(),
                stance: Stance::Refute,
                stance_confidence: Some(0.9),
                reason: " No link found. ".into(),
            },
            EvidenceItem {
                text: "t".into(),
                link: "l".into(),
                domain: String::new(),
                stance: Stance::Neutral,
                stance_confidence: Some(0.0),
                reason: String::new(),
            },
        ];
        assert_eq!(
            evidence_summary(&items),
            "- [REFUTE 0.90] who.int: No link found.\n- [NEUTRAL 0.00] unknown: "
        );
    }

    #[test]
    fn empty_claim_error_message() {
        assert_eq!(VerifyError::EmptyClaim.to_string(), "Claim is empty");
    }
}
