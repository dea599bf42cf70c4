//! Paragraph-boundary passage splitter.
//!
//! Splits the source manual into [`Passage`]s that respect a configurable
//! character limit. Splitting occurs on paragraph boundaries (`\n\n`) to
//! preserve semantic coherence within each passage.
//!
//! Each passage receives a random UUID, a SHA-256 hash of its text for
//! staleness detection, and its position in the source, recorded as
//! metadata.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Passage;

/// Split text into passages on paragraph boundaries, respecting
/// `max_chars`. Returns passages in source order with contiguous indices
/// starting at 0 in their metadata.
///
/// Empty input yields no passages (the corpus invariant requires the
/// passage list and full text to be empty together).
pub fn split_passages(text: &str, max_chars: usize) -> Vec<Passage> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut passages = Vec::new();
    let mut current_buf = String::new();
    let mut index: u64 = 0;

    for para in paragraphs {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed max, flush current buffer
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len() // +2 for \n\n separator
        };

        if would_be > max_chars && !current_buf.is_empty() {
            passages.push(make_passage(index, &current_buf));
            index += 1;
            current_buf.clear();
        }

        // A single oversized paragraph is hard-split at word boundaries
        if trimmed.len() > max_chars {
            if !current_buf.is_empty() {
                passages.push(make_passage(index, &current_buf));
                index += 1;
                current_buf.clear();
            }
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = floor_char_boundary(remaining, remaining.len().min(max_chars));
                let mut actual_split = if split_at < remaining.len() {
                    remaining[..split_at]
                        .rfind('\n')
                        .or_else(|| remaining[..split_at].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(split_at)
                } else {
                    split_at
                };
                // A limit smaller than the first character would stall the
                // loop; take one full character so it always advances.
                if actual_split == 0 {
                    actual_split = remaining
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(remaining.len());
                }
                let piece = remaining[..actual_split].trim();
                if !piece.is_empty() {
                    passages.push(make_passage(index, piece));
                    index += 1;
                }
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        passages.push(make_passage(index, &current_buf));
    }

    passages
}

/// Largest byte offset `<= at` that lands on a UTF-8 character boundary.
fn floor_char_boundary(s: &str, at: usize) -> usize {
    let mut at = at;
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn make_passage(index: u64, text: &str) -> Passage {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let mut passage = Passage::new(Uuid::new_v4().to_string(), text);
    passage
        .metadata
        .insert("index".to_string(), serde_json::json!(index));
    passage
        .metadata
        .insert("hash".to_string(), serde_json::json!(hash));
    passage
}
