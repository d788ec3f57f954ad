//! Line-aligned splitting of long messages.
//!
//! Telegram rejects message texts above 4096 UTF-16 code units. Reports are
//! line oriented, so chunks are cut between lines only; every line keeps its
//! `\n` terminator, which makes the concatenation of all chunks equal to the
//! input text.

use tracing::trace;

/// Maximum message length accepted by `sendMessage`, in UTF-16 code units.
pub const MAX_MESSAGE_UNITS: usize = 4096;

/// Length of `text` in the unit Telegram counts (UTF-16 code units).
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Split `text` into chunks of at most `max_units` UTF-16 units.
///
/// Lines are packed greedily: a chunk is flushed as soon as the next line
/// would overflow it. A single line longer than `max_units` cannot be kept
/// whole; it is cut on character boundaries into `max_units`-sized pieces.
///
/// # Returns
/// Chunks in original order. Empty text or `max_units == 0` yield an empty
/// vector (there is nothing sendable).
pub fn split_into_chunks(text: &str, max_units: usize) -> Vec<String> {
    if text.is_empty() || max_units == 0 {
        trace!("split_into_chunks: empty text or zero limit; nothing to do");
        return Vec::new();
    }
    if utf16_len(text) <= max_units {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_units = 0usize;

    for line in text.split_inclusive('\n') {
        let units = utf16_len(line);

        if units > max_units {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_units = 0;
            }
            chunks.extend(split_long_line(line, max_units));
            continue;
        }

        if current_units + units > max_units {
            chunks.push(std::mem::take(&mut current));
            current_units = 0;
        }
        current.push_str(line);
        current_units += units;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    trace!(chunks = chunks.len(), "split_into_chunks: done");
    chunks
}

/// Cut one oversized line on char boundaries.
fn split_long_line(line: &str, max_units: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_units = 0usize;

    for ch in line.chars() {
        let units = ch.len_utf16();
        if piece_units + units > max_units && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            piece_units = 0;
        }
        piece.push(ch);
        piece_units += units;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_into_chunks("hello\nworld", MAX_MESSAGE_UNITS);
        assert_eq!(chunks, vec!["hello\nworld".to_string()]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_into_chunks("", 10).is_empty());
        assert!(split_into_chunks("abc", 0).is_empty());
    }

    #[test]
    fn packs_whole_lines_greedily() {
        let text = "aaaa\nbbbb\ncccc\ndd";
        let chunks = split_into_chunks(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc\ndd"]);
    }

    #[test]
    fn chunks_are_bounded_and_concatenate_to_input() {
        let text: String = (0..500)
            .map(|i| format!("🔴 <code>INC{i:06}</code> | {i}j | PLAT | JAP | <b>SUGAR</b> | LOS\n"))
            .collect();

        let chunks = split_into_chunks(&text, MAX_MESSAGE_UNITS);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(utf16_len(chunk) <= MAX_MESSAGE_UNITS);
            assert!(chunk.ends_with('\n'), "a chunk ended mid-line");
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn oversized_line_is_cut_between_chars() {
        let long = "é".repeat(25);
        let text = format!("head\n{long}\ntail");
        let chunks = split_into_chunks(&text, 10);

        assert_eq!(chunks.first().map(String::as_str), Some("head\n"));
        assert!(chunks.iter().all(|c| utf16_len(c) <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn surrogate_pairs_count_twice() {
        assert_eq!(utf16_len("🔴"), 2);
        assert_eq!(utf16_len("ab"), 2);
        let chunks = split_into_chunks("🔴🔴🔴", 4);
        assert_eq!(chunks, vec!["🔴🔴", "🔴"]);
    }
}
