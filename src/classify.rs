//! Query intent classification.
//!
//! Maps a raw query to an [`IntentCategory`] by case-insensitive substring
//! matching against fixed keyword lists, checked in decreasing specificity.
//! First match wins; ties are resolved by list order, not by scoring. The
//! keyword lists and priority order are compatibility-critical: downstream
//! routing tests depend on them exactly.
//!
//! The matcher lives behind the [`Classifier`] trait so a model-based
//! classifier can replace it without touching the cascade contract.

use crate::models::IntentCategory;

/// Assigns an [`IntentCategory`] to a raw query.
///
/// Implementations must be total and deterministic: every query maps to
/// exactly one category, and the same query always maps to the same one.
pub trait Classifier: Send + Sync {
    fn classify(&self, query: &str) -> IntentCategory;
}

/// CSV context markers. An explicit "csv data" mention (French or English)
/// or a fenced code block signals inline tabular data.
const CSV_MARKERS: &[&str] = &["csv data", "données csv", "```"];

/// Transport-domain keywords: vehicle type names plus delay/incident terms.
const TRANSPORT_KEYWORDS: &[&str] = &[
    "train", "tgv", "bus", "vol", "retard", "delay", "incident", "numéro", "number",
];

/// Weather-domain keywords, French and English.
const WEATHER_KEYWORDS: &[&str] = &[
    "météo",
    "weather",
    "forecast",
    "prévision",
    "temperature",
    "température",
    "rain",
    "pluie",
];

/// Keyword-list classifier. Pure, no side effects, never fails: queries
/// matching nothing default to [`IntentCategory::Document`].
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, query: &str) -> IntentCategory {
        let lower = query.to_lowercase();

        if CSV_MARKERS.iter().any(|m| lower.contains(m)) {
            IntentCategory::Csv
        } else if TRANSPORT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            IntentCategory::Transport
        } else if WEATHER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            IntentCategory::Weather
        } else {
            IntentCategory::Document
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(q: &str) -> IntentCategory {
        KeywordClassifier::new().classify(q)
    }

    #[test]
    fn test_csv_marker_wins() {
        assert_eq!(classify("voici les données CSV du mois"), IntentCategory::Csv);
        assert_eq!(classify("analyse ce bloc ```csv\na,b\n```"), IntentCategory::Csv);
    }

    #[test]
    fn test_transport_keywords() {
        assert_eq!(
            classify("Quel est le retard du train TGV123 ?"),
            IntentCategory::Transport
        );
        assert_eq!(classify("status of flight VOL AF101"), IntentCategory::Transport);
        assert_eq!(classify("any incident on the line?"), IntentCategory::Transport);
    }

    #[test]
    fn test_weather_keywords() {
        assert_eq!(classify("quelle est la météo à Lyon ?"), IntentCategory::Weather);
        assert_eq!(classify("will it rain tomorrow"), IntentCategory::Weather);
    }

    #[test]
    fn test_document_default() {
        assert_eq!(
            classify("que dit le manuel sur les procédures ?"),
            IntentCategory::Document
        );
        assert_eq!(classify(""), IntentCategory::Document);
    }

    #[test]
    fn test_priority_csv_over_transport() {
        // A fenced block mentioning a train still routes to CSV analysis.
        assert_eq!(classify("```\ntrain,retard\n```"), IntentCategory::Csv);
    }

    #[test]
    fn test_priority_transport_over_weather() {
        // Mixed transport + weather query: transport keywords are checked
        // first, so the more actionable category wins.
        assert_eq!(
            classify("le train est-il en retard à cause de la pluie ?"),
            IntentCategory::Transport
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("RETARD DU TGV"), IntentCategory::Transport);
        assert_eq!(classify("WEATHER in Paris"), IntentCategory::Weather);
    }

    #[test]
    fn test_deterministic() {
        let q = "incident météo sur le réseau";
        assert_eq!(classify(q), classify(q));
    }
}
