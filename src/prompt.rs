//! Prompt construction and the full-document / RAG mode switch.
//!
//! The corpus size, measured once at startup, decides how context reaches
//! the model: a small corpus rides along in the system prompt on every call,
//! a large one gets per-query retrieved extracts prepended to the user
//! message. The switch never changes at runtime.

use crate::models::Corpus;

/// How document context is delivered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// The whole corpus text is embedded in the system prompt.
    FullDocument,
    /// Retrieved extracts are prepended to each user message.
    Rag,
}

impl PromptMode {
    /// Pick the mode from the corpus text length. Below `threshold`
    /// characters the document fits comfortably in the system prompt.
    pub fn select(full_text_len: usize, threshold: usize) -> Self {
        if full_text_len < threshold {
            PromptMode::FullDocument
        } else {
            PromptMode::Rag
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::FullDocument => "full-document",
            PromptMode::Rag => "rag",
        }
    }
}

/// System prompt for the selected mode. In full-document mode the corpus
/// text is inlined between document markers.
pub fn system_prompt(mode: PromptMode, corpus: &Corpus) -> String {
    match mode {
        PromptMode::FullDocument => format!(
            "Tu es un assistant expert qui répond UNIQUEMENT à partir du document suivant.\n\
             \n\
             === DOCUMENT COMPLET ===\n\
             {}\n\
             === FIN DU DOCUMENT ===\n\
             \n\
             INSTRUCTIONS :\n\
             1. Lis ATTENTIVEMENT tout le document ci-dessus\n\
             2. Réponds UNIQUEMENT avec les informations du document\n\
             3. Cite toujours la section et les valeurs exactes\n\
             4. Format : \"D'après le document (Section X.X) : [détails]\"\n\
             5. Si l'info n'est pas dans le document : dis \"Information non trouvée dans le document\"\n\
             \n\
             Ne donne JAMAIS d'informations générales ou inventées.",
            corpus.full_text
        ),
        PromptMode::Rag => "Tu es un assistant expert qui répond à partir des extraits de documents fournis.\n\
             \n\
             INSTRUCTIONS :\n\
             1. Le contexte ci-dessous contient les passages pertinents du document\n\
             2. Lis ATTENTIVEMENT tous les extraits fournis\n\
             3. Réponds en citant les sections et valeurs exactes\n\
             4. Format : \"D'après le document (Section X.X) : [détails]\"\n\
             5. Si l'info n'est pas dans le contexte : dis \"Information non trouvée dans les extraits fournis\"\n\
             \n\
             Ne donne JAMAIS d'informations générales ou inventées."
            .to_string(),
    }
}

/// User message for a document question. In RAG mode the retrieved context
/// block is prepended; in full-document mode the question goes through
/// untouched since the context already lives in the system prompt.
pub fn user_message(mode: PromptMode, context: &str, query: &str) -> String {
    match mode {
        PromptMode::FullDocument => query.to_string(),
        PromptMode::Rag => format!(
            "CONTEXTE DU DOCUMENT :\n{context}\n\nQUESTION :\n{query}"
        ),
    }
}

/// System prompt for CSV analysis questions.
pub fn csv_system_prompt() -> &'static str {
    "Tu es un expert en analyse de données de transport.\n\
     Tu dois analyser les données CSV fournies par l'utilisateur.\n\
     \n\
     RÈGLES STRICTES :\n\
     1. Réponds UNIQUEMENT en français\n\
     2. Utilise EXCLUSIVEMENT les données du CSV fourni\n\
     3. Cherche les termes en anglais ET en français\n\
     4. Regarde toutes les colonnes : IncidentReason, RaisonIncident, Météo, Weather, etc.\n\
     5. Donne des réponses courtes et précises\n\
     6. Si tu trouves une correspondance, cite le numéro de transport et les détails"
}

/// User message wrapping CSV content and the question.
pub fn csv_user_message(csv_content: &str, query: &str) -> String {
    format!(
        "DONNÉES CSV À ANALYSER :\n\
         ```csv\n\
         {csv_content}\n\
         ```\n\
         \n\
         QUESTION : {query}\n\
         \n\
         Analyse les données CSV ligne par ligne.\n\
         Réponds en français."
    )
}
