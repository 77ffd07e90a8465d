// src/providers/mod.rs
//! External collaborators behind capability traits: web search, stance
//! classification and verdict generation.
//!
//! None of these ever return an error to the caller. A failing collaborator yields
//! an empty hit list or a neutral default, so the verifier only ever sees "less
//! evidence".

pub mod genai;
pub mod mock;
pub mod search;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;
use crate::verdict::{GeneratedVerdict, Stance};

pub use genai::{DisabledModel, GeminiModel, GenAi, TextModel};
pub use mock::{MockModel, StaticSearch};
pub use search::{CustomSearchProvider, DisabledSearch};

/// One search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub domain: String,
}

/// Stance of one snippet relative to the claim.
#[derive(Debug, Clone, PartialEq)]
pub struct StanceJudgement {
    pub stance: Stance,
    pub confidence: f64,
    pub reason: String,
}

impl StanceJudgement {
    pub fn new(stance: Stance, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            stance,
            confidence,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `limit` hits, in ranking order. Empty on any failure.
    async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait StanceClassifier: Send + Sync {
    async fn classify(&self, claim: &str, snippet: &str) -> StanceJudgement;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait VerdictGenerator: Send + Sync {
    async fn generate(&self, claim: &str, evidence_summary: &str) -> GeneratedVerdict;
    fn name(&self) -> &'static str;
}

/// The three collaborators the verifier needs.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchProvider>,
    pub classifier: Arc<dyn StanceClassifier>,
    pub generator: Arc<dyn VerdictGenerator>,
}

impl Collaborators {
    /// All collaborators disabled: every request takes the canned-or-uncertain path.
    pub fn disabled() -> Self {
        let genai = Arc::new(GenAi::new(Arc::new(DisabledModel)));
        Self {
            search: Arc::new(DisabledSearch),
            classifier: genai.clone(),
            generator: genai,
        }
    }
}

/// Factory: build collaborators according to settings and environment.
///
/// * If `AI_TEST_MODE=mock`, returns deterministic stand-ins (no network).
/// * Missing credentials degrade the affected collaborator to a disabled one.
pub fn build_collaborators(settings: &Settings) -> Collaborators {
    ensure_metrics_described();

    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        info!("AI_TEST_MODE=mock: using deterministic collaborators");
        let genai = Arc::new(GenAi::new(Arc::new(MockModel::default())));
        return Collaborators {
            search: Arc::new(StaticSearch::fixture()),
            classifier: genai.clone(),
            generator: genai,
        };
    }

    let search: Arc<dyn SearchProvider> = match (&settings.cse_api_key, &settings.cse_id) {
        (Some(key), Some(cx)) => {
            match CustomSearchProvider::new(key.clone(), cx.clone(), settings.http_timeout) {
                Ok(p) => Arc::new(p),
                Err(e) => {
                    warn!(error = %e, "custom search client unavailable; search disabled");
                    Arc::new(DisabledSearch)
                }
            }
        }
        _ => {
            warn!("CSE_API_KEY / CSE_ID not set; live search disabled");
            Arc::new(DisabledSearch)
        }
    };

    let model: Arc<dyn TextModel> = match &settings.genai_api_key {
        Some(key) => match GeminiModel::new(key.clone(), settings.genai_model.clone()) {
            Ok(m) => Arc::new(m),
            Err(e) => {
                warn!(error = %e, "genai client unavailable; classification disabled");
                Arc::new(DisabledModel)
            }
        },
        None => {
            warn!("GENAI_API_KEY not set; genai calls will fall back to neutral defaults");
            Arc::new(DisabledModel)
        }
    };
    let genai = Arc::new(GenAi::new(model));

    info!(
        search = search.name(),
        genai = genai.model_name(),
        "collaborators ready"
    );
    Collaborators {
        search,
        classifier: genai.clone(),
        generator: genai,
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collaborator_errors_total",
            "Failed or unparsable calls to search/genai collaborators."
        );
    });
}

/// Record a collaborator failure.
pub(crate) fn record_error(collaborator: &'static str) {
    counter!("collaborator_errors_total", "collaborator" => collaborator).increment(1);
}
