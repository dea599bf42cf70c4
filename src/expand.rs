//! Query expansion into search-term variations.
//!
//! Generates an ordered list of alternate search terms from the original
//! query. The original query is always variation #0; fixed domain phrasings
//! are appended when the query touches delays, trains, or the manual itself.
//! The cascade tries variations in order, so more canonical phrasings come
//! first within each block.
//!
//! Expansion only aids document-style retrieval; weather and CSV intents get
//! no variations beyond the query itself.

/// Canonical delay-band and policy phrasings appended for delay queries.
const DELAY_VARIATIONS: &[&str] = &[
    "retard mineur 0 à 15 minutes",
    "retard important 15 à 60 minutes",
    "retard critique 60 minutes",
    "CHAPITRE 1 POLITIQUE GESTION RETARDS",
    "dédommagement retard",
    "procédure retard train",
];

const TRAIN_VARIATIONS: &[&str] = &["train procédure", "transport ferroviaire"];

const MANUAL_VARIATIONS: &[&str] = &["MANUEL D'EXPLOITATION", "CHAPITRE", "section procédure"];

/// Expand a query into an ordered list of search variations.
///
/// Deterministic and pure. The returned list always starts with the original
/// query; rule blocks are additive and preserve their listed order.
pub fn expand(query: &str) -> Vec<String> {
    let mut variations = vec![query.to_string()];
    let lower = query.to_lowercase();

    if lower.contains("retard") || lower.contains("delay") {
        variations.extend(DELAY_VARIATIONS.iter().map(|s| s.to_string()));
    }

    if lower.contains("tgv") || lower.contains("train") {
        variations.extend(TRAIN_VARIATIONS.iter().map(|s| s.to_string()));
    }

    if lower.contains("manuel") {
        variations.extend(MANUAL_VARIATIONS.iter().map(|s| s.to_string()));
    }

    variations
}
