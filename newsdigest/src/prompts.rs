//! Prompt construction for every text task.
//!
//! These are pure string functions with no knowledge of the network layer, so
//! the exact instructions sent to the model can be unit tested without a
//! provider. The system instruction is shared verbatim across all tasks.

/// System instruction used for every completion call.
pub const SYSTEM_INSTRUCTION: &str =
    "You are an AI assistant that helps people find information.";

/// Closed set of tone labels the classification task may answer with.
pub const TONE_LABELS: [&str; 11] = [
    "Formal",
    "Informal",
    "Optimistic",
    "Worried",
    "Friendly",
    "Curious",
    "Assertive",
    "Encouraging",
    "Romantic",
    "Harsh",
    "Abusive",
];

/// The text task a prompt is built for.
#[derive(Debug, Clone)]
pub enum TaskKind {
    SummarizeArticle,
    Paraphrase { tone: Option<String> },
    AnalyseTone,
    CorrectGrammar,
    Synonyms,
}

/// A system + user instruction pair ready to send to the provider.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
}

/// Build the instruction pair for a task over the given input text.
///
/// For paraphrasing, a tone is included only when the caller supplied one.
pub fn build_prompt(task: &TaskKind, text: &str) -> PromptSpec {
    let user = match task {
        TaskKind::SummarizeArticle => format!("Summarize the article: '{}'", text),
        TaskKind::Paraphrase { tone: Some(tone) } => format!(
            "Paraphrase the following text in a {} and generate 5 versions of the same. \
             Give this list as an answer, nothing else: '{}'",
            tone, text
        ),
        TaskKind::Paraphrase { tone: None } => format!(
            "Paraphrase the following text and generate 5 versions of the same. \
             Give this list as an answer, nothing else: '{}'",
            text
        ),
        TaskKind::AnalyseTone => format!(
            "Classify the tone of the text into one of the following sentiment - {}. \
             Give answer in one word: {}",
            TONE_LABELS.join(","),
            text
        ),
        TaskKind::CorrectGrammar => format!(
            "Correct the grammar, spellings and punctuation in the statement. \
             Only give the corrected text, nothing else: '{}'",
            text
        ),
        TaskKind::Synonyms => format!(
            "Give 5 synonyms of the word. Give this numbered list as an answer, nothing else: '{}'",
            text
        ),
    };

    PromptSpec {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}

/// Map a raw completion back to a canonical tone label when possible.
/// Models occasionally add punctuation or change case; anything that does not
/// match a known label is returned trimmed as-is.
pub fn canonical_tone(raw: &str) -> String {
    let cleaned = raw.trim().trim_end_matches('.');
    TONE_LABELS
        .iter()
        .find(|label| label.eq_ignore_ascii_case(cleaned))
        .map(|label| label.to_string())
        .unwrap_or_else(|| cleaned.to_string())
}
