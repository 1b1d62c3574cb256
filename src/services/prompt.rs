//! Prompt construction and source extraction for sourced answers.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::RetrievedChunk;

static SOURCES_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SOURCES?:\s*").expect("valid sources marker"));

/// Some models continue with a new question after the sources line.
static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)QUESTION:\s").expect("valid question marker"));

const INSTRUCTIONS: &str = "Given the following extracted parts of long documents and a question, \
create a final answer with references (\"SOURCES\"). If you don't know the answer, just say that \
you don't know; don't try to make up an answer. Answer in the language of the question. \
ALWAYS return a \"SOURCES\" line at the end of your answer, listing the sources you used \
separated by commas.";

/// Build the answer prompt: one `Content:`/`Source:` block per retrieved chunk.
pub fn build_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    let mut summaries = String::new();
    for chunk in chunks {
        let source = chunk.source().unwrap_or("unknown");
        summaries.push_str(&format!("Content: {}\nSource: {}\n\n", chunk.content, source));
    }

    format!(
        "{INSTRUCTIONS}\n\nQUESTION: {question}\n=========\n{summaries}=========\nFINAL ANSWER:"
    )
}

/// Split a model reply into answer text and the listed sources.
///
/// The reply is split at the first `SOURCES:` (or `SOURCE:`) marker. Without
/// one the whole reply is the answer and no sources are returned.
pub fn parse_answer(reply: &str) -> (String, Vec<String>) {
    let Some(marker) = SOURCES_MARKER.find(reply) else {
        return (reply.trim().to_string(), Vec::new());
    };

    let answer = reply[..marker.start()].trim().to_string();
    let listed = &reply[marker.end()..];
    let listed = match QUESTION_MARKER.find(listed) {
        Some(question) => &listed[..question.start()],
        None => listed,
    };

    let mut sources: Vec<String> = Vec::new();
    for source in listed.split([',', '\n']) {
        let source = source.trim().trim_matches('-').trim();
        if !source.is_empty() && !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }

    (answer, sources)
}
