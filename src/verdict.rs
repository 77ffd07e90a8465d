//! verdict.rs: Data model for evidence, signals and the `/verify` response,
//! plus the two response builders (canned entry → response, live aggregation → response).
//!
//! Deserialization is lenient: missing or malformed fields in canned data fall back
//! to neutral defaults instead of failing the whole record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::canned::CannedEntry;
use crate::scoring::{education, Aggregation};

/// Maximum number of evidence items returned to clients.
pub const MAX_EVIDENCE: usize = 3;

/// Verdict and confidence used whenever nothing could be verified.
pub const UNCERTAIN_VERDICT: &str = "Uncertain";
pub const UNCERTAIN_CONFIDENCE: f64 = 0.35;
pub const UNCERTAIN_TIP: &str =
    "No strong evidence found. Check official sources or refine the claim.";

/// A document's relationship to the claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stance {
    Support,
    Refute,
    #[default]
    Neutral,
}

impl Stance {
    /// Case-insensitive parse; anything unrecognized ("mixed", "unrelated", "") is neutral.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUPPORT" => Stance::Support,
            "REFUTE" => Stance::Refute,
            _ => Stance::Neutral,
        }
    }

    /// `+1` for support, `-1` for refute, `0` otherwise.
    pub fn sign(self) -> f64 {
        match self {
            Stance::Support => 1.0,
            Stance::Refute => -1.0,
            Stance::Neutral => 0.0,
        }
    }

    /// Support and refute count as corroboration; neutral does not.
    pub fn is_relevant(self) -> bool {
        !matches!(self, Stance::Neutral)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Support => "SUPPORT",
            Stance::Refute => "REFUTE",
            Stance::Neutral => "NEUTRAL",
        }
    }
}

impl<'de> Deserialize<'de> for Stance {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(raw.as_str().map(Stance::parse).unwrap_or_default())
    }
}

/// Stance confidence assumed for evidence that does not state one.
pub const DEFAULT_STANCE_CONFIDENCE: f64 = 0.5;

/// One retrieved document judged against the claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
    /// Canned data historically calls this `source`.
    #[serde(default, alias = "source")]
    pub domain: String,
    #[serde(default)]
    pub stance: Stance,
    /// Absent in some canned records; present but non-numeric → 0.0.
    #[serde(
        default,
        deserialize_with = "present_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub stance_confidence: Option<f64>,
    #[serde(default)]
    pub reason: String,
}

impl EvidenceItem {
    /// Confidence used for scoring; an unstated one counts as 0.5.
    pub fn confidence(&self) -> f64 {
        self.stance_confidence.unwrap_or(DEFAULT_STANCE_CONFIDENCE)
    }
}

/// The four named signals. Serialized with their short names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signals {
    /// Source Reliability
    #[serde(rename = "SR", deserialize_with = "lenient_confidence")]
    pub sr: f64,
    /// Corroboration Count
    #[serde(rename = "CC", deserialize_with = "lenient_confidence")]
    pub cc: f64,
    /// Stance-Mean
    #[serde(rename = "SM", deserialize_with = "lenient_confidence")]
    pub sm: f64,
    /// Evidence Quality
    #[serde(rename = "EQ", deserialize_with = "lenient_confidence")]
    pub eq: f64,
}

impl Signals {
    pub const ZERO: Signals = Signals {
        sr: 0.0,
        cc: 0.0,
        sm: 0.0,
        eq: 0.0,
    };

    /// Clamp each component into [0,1] and round to two decimals.
    pub fn rounded(self) -> Self {
        Self {
            sr: round_to(clamp01(self.sr), 2),
            cc: round_to(clamp01(self.cc), 2),
            sm: round_to(clamp01(self.sm), 2),
            eq: round_to(clamp01(self.eq), 2),
        }
    }
}

/// The only externally visible artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub verdict: String,
    pub confidence: f64,
    pub evidence: Vec<EvidenceItem>,
    pub signals: Signals,
    pub education_tip: String,
}

/// Output of the verdict-generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVerdict {
    pub verdict: String,
    pub confidence: f64,
    pub tip: String,
}

impl GeneratedVerdict {
    pub fn new(verdict: impl Into<String>, confidence: f64, tip: impl Into<String>) -> Self {
        Self {
            verdict: verdict.into(),
            confidence,
            tip: tip.into(),
        }
    }
}

/// Fixed response for "no canned match and no retrieved documents".
/// Identical on every call.
pub fn uncertain_fallback() -> VerdictResponse {
    VerdictResponse {
        verdict: UNCERTAIN_VERDICT.to_string(),
        confidence: UNCERTAIN_CONFIDENCE,
        evidence: Vec::new(),
        signals: Signals::ZERO,
        education_tip: UNCERTAIN_TIP.to_string(),
    }
}

/// Shape a canned entry into a response, defaulting whatever the entry leaves out.
pub fn from_canned(entry: &CannedEntry) -> VerdictResponse {
    let signals = entry.signals.unwrap_or_default().rounded();
    let education_tip = match entry.education_tip.as_deref().map(str::trim) {
        Some(tip) if !tip.is_empty() => tip.to_string(),
        _ => education::tip_for(&signals).to_string(),
    };
    let verdict = match entry.verdict.as_deref() {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => UNCERTAIN_VERDICT.to_string(),
    };

    VerdictResponse {
        verdict,
        confidence: clamp01(entry.confidence.unwrap_or(UNCERTAIN_CONFIDENCE)),
        evidence: entry.evidence.iter().take(MAX_EVIDENCE).cloned().collect(),
        signals,
        education_tip,
    }
}

/// Combine the aggregated evidence with the generated verdict.
///
/// Confidence is the mean of the aggregated score and the generated confidence,
/// rounded to three decimals.
pub fn assemble(
    mut evidence: Vec<EvidenceItem>,
    aggregation: &Aggregation,
    generated: GeneratedVerdict,
) -> VerdictResponse {
    evidence.truncate(MAX_EVIDENCE);
    let signals = aggregation.signals.rounded();
    let external = if generated.confidence.is_finite() {
        clamp01(generated.confidence)
    } else {
        0.0
    };
    let confidence = round_to((aggregation.score + external) / 2.0, 3);

    let education_tip = if generated.tip.trim().is_empty() {
        education::tip_for(&signals).to_string()
    } else {
        generated.tip.trim().to_string()
    };

    VerdictResponse {
        verdict: generated.verdict,
        confidence,
        evidence,
        signals,
        education_tip,
    }
}

/// Clamp to [0.0, 1.0]; NaN becomes 0.0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

/// Accept JSON numbers and numeric strings; anything else is `None`.
pub(crate) fn lenient_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

fn lenient_confidence<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(lenient_number(&raw).unwrap_or(0.0))
}

fn present_confidence<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    lenient_confidence(d).map(Some)
}

pub(crate) fn lenient_opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(lenient_number(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(domain: &str, stance: Stance, conf: f64) -> EvidenceItem {
        EvidenceItem {
            text: format!("snippet from {domain}"),
            link: format!("https://{domain}/a"),
            domain: domain.to_string(),
            stance,
            stance_confidence: Some(conf),
            reason: String::new(),
        }
    }

    #[test]
    fn stance_parse_is_case_insensitive_and_defaults_to_neutral() {
        assert_eq!(Stance::parse("support"), Stance::Support);
        assert_eq!(Stance::parse(" Refute "), Stance::Refute);
        assert_eq!(Stance::parse("mixed"), Stance::Neutral);
        assert_eq!(Stance::parse(""), Stance::Neutral);
    }

    #[test]
    fn evidence_item_tolerates_missing_and_malformed_fields() {
        let v: EvidenceItem = serde_json::from_value(json!({
            "text": "WHO: no evidence",
            "source": "WHO",
            "stance": "refute"
        }))
        .unwrap();
        assert_eq!(v.domain, "WHO");
        assert_eq!(v.stance, Stance::Refute);
        assert_eq!(v.stance_confidence, None);
        assert!((v.confidence() - 0.5).abs() < 1e-12);
        // an unstated confidence is not echoed back
        let echoed = serde_json::to_value(&v).unwrap();
        assert!(echoed.get("stance_confidence").is_none());

        let w: EvidenceItem = serde_json::from_value(json!({
            "stance": 42,
            "stance_confidence": "very high"
        }))
        .unwrap();
        assert_eq!(w.stance, Stance::Neutral);
        assert_eq!(w.stance_confidence, Some(0.0));

        let s: EvidenceItem =
            serde_json::from_value(json!({ "stance": null, "stance_confidence": "0.7" })).unwrap();
        assert_eq!(s.stance, Stance::Neutral);
        assert!((s.confidence() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn signals_serialize_with_short_names() {
        let s = Signals {
            sr: 0.9,
            cc: 1.0,
            sm: 0.5,
            eq: 0.9,
        };
        let v = serde_json::to_value(s).unwrap();
        assert_eq!(v, json!({ "SR": 0.9, "CC": 1.0, "SM": 0.5, "EQ": 0.9 }));
    }

    #[test]
    fn signals_ignore_unknown_keys() {
        let s: Signals =
            serde_json::from_value(json!({ "SR": 0.9, "CC": 0.8, "TC": 1.0 })).unwrap();
        assert_eq!(s.sr, 0.9);
        assert_eq!(s.cc, 0.8);
        assert_eq!(s.sm, 0.0);
    }

    #[test]
    fn fallback_is_stable() {
        let a = uncertain_fallback();
        let b = uncertain_fallback();
        assert_eq!(a, b);
        assert_eq!(a.verdict, "Uncertain");
        assert_eq!(a.confidence, 0.35);
        assert!(a.evidence.is_empty());
        assert_eq!(a.signals, Signals::ZERO);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn assemble_truncates_evidence_and_averages_confidence() {
        let evidence = vec![
            item("a.com", Stance::Support, 1.0),
            item("b.com", Stance::Support, 1.0),
            item("c.com", Stance::Support, 1.0),
            item("d.com", Stance::Neutral, 0.4),
        ];
        let agg = Aggregation {
            signals: Signals {
                sr: 0.456,
                cc: 1.0,
                sm: 0.8,
                eq: 0.456,
            },
            score: 0.7,
        };
        let out = assemble(
            evidence,
            &agg,
            GeneratedVerdict::new("Likely True", 0.9, "Check dates."),
        );
        assert_eq!(out.evidence.len(), MAX_EVIDENCE);
        assert_eq!(out.evidence[2].domain, "c.com");
        assert!((out.confidence - 0.8).abs() < 1e-12);
        assert_eq!(out.signals.sr, 0.46);
        assert_eq!(out.verdict, "Likely True");
        assert_eq!(out.education_tip, "Check dates.");
    }

    #[test]
    fn assemble_rounds_to_three_decimals_and_clamps_external() {
        let agg = Aggregation {
            signals: Signals::ZERO,
            score: 0.3337,
        };
        let out = assemble(Vec::new(), &agg, GeneratedVerdict::new("Disputed", 7.0, ""));
        // (0.3337 + 1.0) / 2 = 0.66685 -> 0.667
        assert!((out.confidence - 0.667).abs() < 1e-12);
        // empty tip falls back to the signal-driven education tip
        assert!(!out.education_tip.is_empty());
    }

    #[test]
    fn canned_verdict_is_kept_as_stored() {
        let entry = CannedEntry {
            verdict: Some(" Likely False ".into()),
            evidence: vec![serde_json::from_value(json!({
                "text": "No nationwide ban verified",
                "source": "example-news.com",
                "stance": "mixed"
            }))
            .unwrap()],
            ..Default::default()
        };
        let out = from_canned(&entry);
        assert_eq!(out.verdict, " Likely False ");

        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["evidence"][0]["stance"], "NEUTRAL");
        assert!(v["evidence"][0].get("stance_confidence").is_none());

        let blank = CannedEntry {
            verdict: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(from_canned(&blank).verdict, UNCERTAIN_VERDICT);
    }

    #[test]
    fn round_to_behaves() {
        assert_eq!(round_to(0.456, 2), 0.46);
        assert_eq!(round_to(0.95, 3), 0.95);
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(3.0), 1.0);
    }
}
