//! Text corpus extraction
//!
//! Turns an OCR response into a plain text query for entity extraction:
//! low-confidence paragraphs are dropped, detected breaks become spaces and
//! anything that is not an ASCII letter or digit is collapsed to one space.

use std::sync::OnceLock;

use regex::Regex;

use crate::vision::{BreakType, OcrResponse};

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9A-Za-z]+").expect("valid pattern"))
}

/// Build the text corpus for a response
///
/// Returns `None` when nothing usable remains.
pub fn extract_corpus(response: &OcrResponse, confidence_threshold: f32) -> Option<String> {
    let mut words = String::new();

    let paragraphs = response
        .pages
        .iter()
        .flat_map(|page| &page.blocks)
        .flat_map(|block| &block.paragraphs)
        .filter(|paragraph| paragraph.confidence >= confidence_threshold);

    for paragraph in paragraphs {
        for symbol in paragraph.words.iter().flat_map(|word| &word.symbols) {
            words.push_str(&symbol.text);
            if symbol.break_type() != BreakType::Unknown {
                words.push(' ');
            }
        }
    }

    let cleaned = non_alphanumeric().replace_all(&words, " ");
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}
