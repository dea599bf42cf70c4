//! Context assembly: turn a retrieval result into the block of text handed
//! to the language model alongside the user's question.

use crate::models::RetrievalResult;

const HEADER: &str = "=== INFORMATIONS PERTINENTES DU MANUEL ===";
const FOOTER: &str = "=== FIN DES INFORMATIONS ===";

/// Format retrieved passages as a delimited, numbered context block.
///
/// Passages appear in retrieval order, each under its own `--- Extrait N ---`
/// heading, content untouched. The enclosing markers let the model (and a
/// human reading logs) tell retrieved context apart from the question.
pub fn assemble(result: &RetrievalResult) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for (i, passage) in result.passages.iter().enumerate() {
        out.push_str(&format!("\n--- Extrait {} ---\n", i + 1));
        out.push_str(&passage.content);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(FOOTER);
    out
}
