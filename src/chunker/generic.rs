//! Generic fallback chunking: sentence accumulation with word-level splits
//! for oversized sentences.

use tracing::warn;

use super::error::ChunkerError;
use super::tokens::TokenCounter;

/// Splits `text` by sentence boundary, accumulating sentences into chunks
/// under `max_tokens`.
pub fn chunk_generic(
    text: &str,
    counter: &TokenCounter,
    max_tokens: usize,
) -> Result<Vec<String>, ChunkerError> {
    let sentences = split_sentences(text);
    accumulate_units(&sentences, counter, max_tokens)
}

/// Accumulates contiguous text units into a running buffer, flushing when
/// adding the next unit would exceed the budget. A unit that alone exceeds
/// the budget is split by words instead of being dropped.
pub(super) fn accumulate_units(
    units: &[&str],
    counter: &TokenCounter,
    max_tokens: usize,
) -> Result<Vec<String>, ChunkerError> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for unit in units {
        if unit.trim().is_empty() {
            buffer.push_str(unit);
            continue;
        }

        if counter.count(unit)? > max_tokens {
            if !buffer.trim().is_empty() {
                chunks.push(std::mem::take(&mut buffer));
            } else {
                buffer.clear();
            }
            chunks.extend(split_words(unit, counter, max_tokens)?);
            continue;
        }

        let candidate_len = buffer.len() + unit.len();
        let mut candidate = String::with_capacity(candidate_len);
        candidate.push_str(&buffer);
        candidate.push_str(unit);

        if counter.count(&candidate)? > max_tokens && !buffer.trim().is_empty() {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(unit);
        } else {
            buffer = candidate;
        }
    }

    if !buffer.trim().is_empty() {
        chunks.push(buffer);
    }

    Ok(chunks)
}

/// Splits one oversized unit by whitespace words. A single word that alone
/// exceeds the budget is emitted as its own oversized chunk, never silently
/// truncated; the embedding caller decides whether to skip or truncate it.
pub(super) fn split_words(
    unit: &str,
    counter: &TokenCounter,
    max_tokens: usize,
) -> Result<Vec<String>, ChunkerError> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for word in unit.split_whitespace() {
        if counter.count(word)? > max_tokens {
            if !buffer.is_empty() {
                chunks.push(std::mem::take(&mut buffer));
            }
            warn!(
                word_len = word.len(),
                max_tokens, "single word exceeds token budget, emitting oversized chunk"
            );
            chunks.push(word.to_string());
            continue;
        }

        let candidate = if buffer.is_empty() {
            word.to_string()
        } else {
            format!("{buffer} {word}")
        };

        if counter.count(&candidate)? > max_tokens && !buffer.is_empty() {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(word);
        } else {
            buffer = candidate;
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    Ok(chunks)
}

/// Splits `text` into contiguous sentence slices. Each slice carries its
/// terminating punctuation and trailing whitespace, so concatenating the
/// slices reproduces `text` exactly.
pub(super) fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            // Swallow consecutive terminators ("..." / "?!").
            while i + 1 < bytes.len() && matches!(bytes[i + 1], b'.' | b'!' | b'?') {
                i += 1;
            }
            // A boundary needs following whitespace (or end of text).
            if i + 1 >= bytes.len() || bytes[i + 1].is_ascii_whitespace() {
                while i + 1 < bytes.len() && bytes[i + 1].is_ascii_whitespace() {
                    i += 1;
                }
                sentences.push(&text[start..=i]);
                start = i + 1;
            }
        }
        i += 1;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}
