//! Recovery of structured question data from unreliable model output.
//!
//! Models are told to return bare JSON but routinely wrap it in markdown
//! fences, prepend reasoning, or fall back to a bolded key-value layout.
//! `recover` runs a fixed chain of normalizers and parse stages and always
//! returns; a `None` payload means the caller must fall back to its
//! placeholder record.

use serde_json::{json, Value};

use crate::models::domain::QuestionKind;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

const QUESTION_HEADERS: [&str; 2] = ["**Question:**", "**Question Stem:**"];
const OPTIONS_HEADERS: [&str; 1] = ["**Options:**"];
const ANSWER_HEADERS: [&str; 2] = ["**Correct Answer:**", "**Answer:**"];
const CONCEPT_HEADERS: [&str; 1] = ["**Concept Phrase:**"];
const EXPLANATION_HEADERS: [&str; 1] = ["**Explanation:**"];

const OPTION_MARKERS: [&str; 4] = ["A.", "B.", "C.", "D."];

/// Result of a recovery pass. `text` is the normalized (preamble-stripped,
/// unfenced) input, kept for diagnostic logging when `payload` is `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Recovered {
    pub payload: Option<Value>,
    pub text: String,
}

/// Runs the recovery chain over raw model output. Stages run in a fixed
/// order and each parse stage is attempted only after the previous one
/// failed to produce usable data.
pub fn recover(raw: &str, kind: QuestionKind) -> Recovered {
    let text = unwrap_code_fence(strip_reasoning_preamble(raw)).to_string();

    let payload = parse_direct(&text, kind)
        .or_else(|| rebuild_labeled_block(&text))
        .or_else(|| extract_embedded_object(&text));

    Recovered { payload, text }
}

/// Drops a `<think>…</think>` reasoning preamble. A lone opening tag with
/// no closing tag leaves the text untouched.
fn strip_reasoning_preamble(text: &str) -> &str {
    if text.contains(THINK_OPEN) {
        if let Some(close) = text.find(THINK_CLOSE) {
            return text[close + THINK_CLOSE.len()..].trim();
        }
    }
    text.trim()
}

/// Strips a surrounding markdown code fence, tolerating a `json` language
/// tag on the opening fence.
fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    body.strip_prefix("json").unwrap_or(body).trim()
}

/// Stage 3: the happy path. The normalized text is itself a JSON object
/// carrying the keys the requested question kind needs.
fn parse_direct(text: &str, kind: QuestionKind) -> Option<Value> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    let required: &[&str] = match kind {
        QuestionKind::MultipleChoice => &["question", "options", "correct_answer"],
        QuestionKind::TrueFalse | QuestionKind::Cloze => &["question", "correct_answer"],
    };
    if required.iter().all(|key| object.contains_key(*key)) {
        Some(value)
    } else {
        None
    }
}

/// Stage 4: reconstructs an object from a bolded key-value layout. Only the
/// multiple-choice label set is recognized, and the reconstructed record is
/// always typed `multiple_choice`.
fn rebuild_labeled_block(text: &str) -> Option<Value> {
    let question = labeled_section(text, &QUESTION_HEADERS)?;
    let options_block = labeled_section(text, &OPTIONS_HEADERS)?;
    let correct_answer = labeled_section(text, &ANSWER_HEADERS)?;

    let options: Vec<String> = options_block
        .lines()
        .map(str::trim)
        .filter(|line| OPTION_MARKERS.iter().any(|marker| line.starts_with(marker)))
        .map(ToString::to_string)
        .collect();

    let concept_phrase = labeled_section(text, &CONCEPT_HEADERS).unwrap_or_default();
    let explanation = labeled_section(text, &EXPLANATION_HEADERS).unwrap_or_default();

    log::info!("Reconstructed question object from labeled text block");

    Some(json!({
        "question": question,
        "options": options,
        "correct_answer": correct_answer,
        "type": "multiple_choice",
        "concept_phrase": concept_phrase,
        "explanation": explanation,
    }))
}

/// Text between the first present header variant and the next recognized
/// header (or end of input).
fn labeled_section(text: &str, headers: &[&str]) -> Option<String> {
    let header = headers.iter().find(|header| text.contains(**header))?;
    let start = text.find(header)? + header.len();
    let rest = &text[start..];

    let end = all_headers()
        .filter_map(|other| rest.find(other))
        .min()
        .unwrap_or(rest.len());

    Some(rest[..end].trim().to_string())
}

fn all_headers() -> impl Iterator<Item = &'static str> {
    QUESTION_HEADERS
        .into_iter()
        .chain(OPTIONS_HEADERS)
        .chain(ANSWER_HEADERS)
        .chain(CONCEPT_HEADERS)
        .chain(EXPLANATION_HEADERS)
}

/// Stage 5: pulls the first balanced-looking object span out of surrounding
/// prose (first `{` through last `}`) and tries to parse it.
fn extract_embedded_object(text: &str) -> Option<Value> {
    let open = text.find('{')?;
    let close = text.rfind('}')?;
    if close <= open {
        return None;
    }

    let candidate = &text[open..=close];
    let value: Value = serde_json::from_str(candidate).ok()?;
    value.is_object().then(|| {
        log::info!("Extracted embedded JSON object from response text");
        value
    })
}
