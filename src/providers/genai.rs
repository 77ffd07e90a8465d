//! Generative-language adapter: model abstraction + prompt/response handling for
//! stance classification and verdict generation.
//!
//! The model is asked for a JSON object. When the reply has none (or it does not
//! parse) a keyword heuristic runs over the raw text; when there is no reply at
//! all a fixed neutral default is returned.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{record_error, StanceClassifier, StanceJudgement, VerdictGenerator};
use crate::text::{normalize_text, truncate_chars};
use crate::verdict::{lenient_number, GeneratedVerdict, Stance};

const GENAI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_OUTPUT_TOKENS: u32 = 250;
const REASON_CHARS: usize = 200;

// ------------------------------------------------------------
// Model abstraction + concrete models
// ------------------------------------------------------------

/// Low-level text model: one prompt in, raw text out. `None` on any failure.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Option<String>;
    fn name(&self) -> &'static str;
}

/// Google Generative Language API (`generateContent`).
pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiModel {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("claim-checker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building genai http client")?;
        Ok(Self {
            http,
            api_key,
            model,
            endpoint: GENAI_ENDPOINT.to_string(),
        })
    }

    /// Point at a different endpoint (local fakes).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    async fn generate_text(&self, prompt: &str) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            max_output_tokens: u32,
            temperature: f32,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }
        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: String,
        }

        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: 0.2,
            },
        };

        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let resp = match self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, model = %self.model, "genai request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(status = %resp.status(), model = %self.model, "genai non-2xx");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let text: String = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Returns `None` always; used when no API key is configured.
pub struct DisabledModel;

#[async_trait]
impl TextModel for DisabledModel {
    async fn generate_text(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

// ------------------------------------------------------------
// Classifier + generator on top of any TextModel
// ------------------------------------------------------------

/// Prompting and parsing around a `TextModel`. Implements both collaborator traits.
pub struct GenAi {
    model: Arc<dyn TextModel>,
}

impl GenAi {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }
}

#[async_trait]
impl StanceClassifier for GenAi {
    async fn classify(&self, claim: &str, snippet: &str) -> StanceJudgement {
        let prompt = classify_prompt(claim, snippet);
        match self.model.generate_text(&prompt).await {
            Some(text) => parse_stance(&text),
            None => {
                record_error("classify");
                StanceJudgement::new(Stance::Neutral, 0.0, "GenAI unavailable")
            }
        }
    }

    fn name(&self) -> &'static str {
        self.model.name()
    }
}

#[async_trait]
impl VerdictGenerator for GenAi {
    async fn generate(&self, claim: &str, evidence_summary: &str) -> GeneratedVerdict {
        let prompt = verdict_prompt(claim, evidence_summary);
        match self.model.generate_text(&prompt).await {
            Some(text) => parse_verdict(&text),
            None => {
                record_error("generate");
                GeneratedVerdict::new("Uncertain", 0.35, "Verify with primary sources.")
            }
        }
    }

    fn name(&self) -> &'static str {
        self.model.name()
    }
}

// ------------------------------------------------------------
// Prompts
// ------------------------------------------------------------

pub fn classify_prompt(claim: &str, snippet: &str) -> String {
    format!(
        r#"You are a concise fact-check assistant.
Claim: "{claim}"
Snippet: "{snippet}"

Task:
1. Does the snippet SUPPORT, REFUTE, or is it NEUTRAL/UNRELATED?
2. Give confidence 0-1.
3. One-sentence reason.

Return JSON:
{{"stance":"SUPPORT","confidence":0.85,"reason":"..."}}
"#,
        claim = normalize_text(claim),
        snippet = normalize_text(snippet),
    )
}

pub fn verdict_prompt(claim: &str, evidence_summary: &str) -> String {
    format!(
        r#"You are a neutral fact-check assistant.
Claim: "{claim}"
Evidence summary:
{evidence_summary}

Task:
1. Short verdict: Likely True / Likely False / Disputed / Uncertain
2. Confidence 0-1
3. One-line education tip (<=20 words)

Return JSON:
{{"verdict":"Likely False","confidence":0.82,"tip":"..."}}
"#,
        claim = normalize_text(claim),
    )
}

// ------------------------------------------------------------
// Parsing
// ------------------------------------------------------------

static RE_JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex"));

/// First-`{` to last-`}` span of `text`, parsed as a JSON object.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let m = RE_JSON_OBJECT.find(text)?;
    match serde_json::from_str::<Value>(m.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn str_field<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Parse a classification reply.
pub fn parse_stance(text: &str) -> StanceJudgement {
    if let Some(map) = extract_json_object(text) {
        let stance = str_field(&map, "stance")
            .map(Stance::parse)
            .unwrap_or_default();
        let confidence = map.get("confidence").and_then(lenient_number).unwrap_or(0.0);
        let reason = str_field(&map, "reason").unwrap_or_default().to_string();
        return StanceJudgement::new(stance, confidence, reason);
    }

    let low = text.to_lowercase();
    let reason = truncate_chars(text, REASON_CHARS);
    if low.contains("support") && !low.contains("refute") {
        return StanceJudgement::new(Stance::Support, 0.6, reason);
    }
    if low.contains("refute") || low.contains("deny") || low.contains("no evidence") {
        return StanceJudgement::new(Stance::Refute, 0.6, reason);
    }
    StanceJudgement::new(Stance::Neutral, 0.4, reason)
}

/// Parse a verdict reply. An object with an unparsable confidence falls through to
/// the keyword heuristics.
pub fn parse_verdict(text: &str) -> GeneratedVerdict {
    if let Some(map) = extract_json_object(text) {
        let confidence = match map.get("confidence") {
            None => Some(0.4),
            Some(v) => lenient_number(v),
        };
        if let Some(confidence) = confidence {
            let verdict = str_field(&map, "verdict").unwrap_or("Uncertain");
            let tip = str_field(&map, "tip").unwrap_or("Verify with official sources.");
            return GeneratedVerdict::new(verdict, confidence, tip);
        }
    }

    let low = text.to_lowercase();
    if low.contains("likely true") {
        return GeneratedVerdict::new("Likely True", 0.65, "Check original sources and dates.");
    }
    if low.contains("likely false") {
        return GeneratedVerdict::new("Likely False", 0.75, "Check authoritative sources.");
    }
    GeneratedVerdict::new("Uncertain", 0.4, "Verify with primary sources.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stance_from_fenced_json() {
        let text = "Sure!\n```json\n{\"stance\":\"refute\",\"confidence\":0.85,\"reason\":\"WHO says no.\"}\n```";
        let j = parse_stance(text);
        assert_eq!(j.stance, Stance::Refute);
        assert!((j.confidence - 0.85).abs() < 1e-12);
        assert_eq!(j.reason, "WHO says no.");
    }

    #[test]
    fn stance_json_with_odd_fields() {
        let j = parse_stance(r#"{"stance":"UNRELATED","confidence":"0.3"}"#);
        assert_eq!(j.stance, Stance::Neutral);
        assert!((j.confidence - 0.3).abs() < 1e-12);
        assert_eq!(j.reason, "");

        let k = parse_stance(r#"{"stance":"SUPPORT","confidence":"high"}"#);
        assert_eq!(k.stance, Stance::Support);
        assert_eq!(k.confidence, 0.0);
    }

    #[test]
    fn stance_keyword_fallbacks() {
        let s = parse_stance("The snippet seems to support the claim.");
        assert_eq!((s.stance, s.confidence), (Stance::Support, 0.6));

        let r = parse_stance("It does support part of it, but mostly it would refute it.");
        assert_eq!(r.stance, Stance::Refute);

        let d = parse_stance("Officials deny this happened.");
        assert_eq!(d.stance, Stance::Refute);

        let n = parse_stance("There is No Evidence for this.");
        assert_eq!(n.stance, Stance::Refute);

        let neutral = parse_stance("Unclear.");
        assert_eq!((neutral.stance, neutral.confidence), (Stance::Neutral, 0.4));
    }

    #[test]
    fn stance_fallback_reason_is_truncated() {
        let long = "x".repeat(500);
        assert_eq!(parse_stance(&long).reason.chars().count(), REASON_CHARS);
    }

    #[test]
    fn verdict_from_json_with_defaults() {
        let v = parse_verdict(r#"{"verdict":"Likely False","confidence":0.82,"tip":"Check WHO."}"#);
        assert_eq!(v, GeneratedVerdict::new("Likely False", 0.82, "Check WHO."));

        let d = parse_verdict("{}");
        assert_eq!(
            d,
            GeneratedVerdict::new("Uncertain", 0.4, "Verify with official sources.")
        );
    }

    #[test]
    fn verdict_bad_confidence_falls_through_to_keywords() {
        let v = parse_verdict(r#"{"verdict":"Likely True","confidence":"sure"}"#);
        assert_eq!(v.verdict, "Likely True");
        assert_eq!(v.confidence, 0.65);
    }

    #[test]
    fn verdict_keyword_fallbacks() {
        assert_eq!(parse_verdict("This is likely false.").confidence, 0.75);
        assert_eq!(parse_verdict("Probably LIKELY TRUE").verdict, "Likely True");
        assert_eq!(
            parse_verdict("no idea"),
            GeneratedVerdict::new("Uncertain", 0.4, "Verify with primary sources.")
        );
    }

    #[test]
    fn non_object_json_is_ignored() {
        assert!(extract_json_object("[1, 2]").is_none());
        assert!(extract_json_object("{not json}").is_none());
    }

    #[tokio::test]
    async fn disabled_model_yields_neutral_defaults() {
        let g = GenAi::new(Arc::new(DisabledModel));
        let j = g.classify("claim", "snippet").await;
        assert_eq!(j, StanceJudgement::new(Stance::Neutral, 0.0, "GenAI unavailable"));
        let v = g.generate("claim", "summary").await;
        assert_eq!(
            v,
            GeneratedVerdict::new("Uncertain", 0.35, "Verify with primary sources.")
        );
    }

    #[test]
    fn prompts_embed_normalized_inputs() {
        let p = classify_prompt("  Earth&nbsp;is   flat ", "NASA <b>photos</b>");
        assert!(p.contains("Claim: \"Earth is flat\""));
        assert!(p.contains("Snippet: \"NASA photos\""));
        let v = verdict_prompt("x", "- [SUPPORT 0.90] who.int: ok");
        assert!(v.contains("- [SUPPORT 0.90] who.int: ok"));
    }
}
