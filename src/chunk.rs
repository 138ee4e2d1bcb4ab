//! Separator-priority text chunker.
//!
//! Splits chapter body text into windows of at most `chunk_size` characters,
//! preferring to break at semantic boundaries: `## `/`### ` headings first,
//! then blank-line paragraph breaks, then single newlines, then spaces, then
//! individual characters as a last resort. Neighboring windows share up to
//! `chunk_overlap` characters of trailing/leading context.
//!
//! # Algorithm
//!
//! 1. Pick the first separator in the priority list that occurs in the text.
//! 2. Split on it, keeping each separator attached to the piece it precedes
//!    so that concatenating the pieces reproduces the input exactly.
//! 3. Greedily accumulate pieces into a window until adding the next piece
//!    would exceed `chunk_size`; emit the window, then carry trailing pieces
//!    totalling at most `chunk_overlap` characters into the next window.
//! 4. A single piece longer than `chunk_size` recurses into the remaining
//!    separators instead of being emitted oversized.
//!
//! Lengths are measured in characters, not bytes, so multi-byte input never
//! splits inside a code point.

use std::collections::VecDeque;

/// Split boundaries in priority order. Mirrors the chapter indexer's
/// heading-aware configuration; the final empty separator falls back to
/// per-character splitting so no token is ever truncated.
pub const SEPARATORS: &[&str] = &["\n## ", "\n### ", "\n\n", "\n", " ", ""];

/// Split `text` into ordered chunks covering it.
///
/// Every chunk is at most `chunk_size` characters; consecutive chunks share
/// up to `chunk_overlap` characters of context. Deterministic for identical
/// `(text, chunk_size, chunk_overlap)` inputs. Empty input yields an empty
/// sequence.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    split_recursive(text, chunk_size, chunk_overlap, SEPARATORS)
}

fn split_recursive(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    let (separator, rest) = pick_separator(text, separators);
    let pieces = split_keeping_separator(text, separator);

    let mut chunks = Vec::new();
    let mut small: Vec<String> = Vec::new();

    for piece in pieces {
        if char_len(&piece) <= chunk_size {
            small.push(piece);
            continue;
        }

        if !small.is_empty() {
            merge_pieces(&small, chunk_size, chunk_overlap, &mut chunks);
            small.clear();
        }

        if rest.is_empty() {
            // No finer separator left: emit the token whole rather than
            // truncate. Unreachable while SEPARATORS ends with "".
            chunks.push(piece);
        } else {
            chunks.extend(split_recursive(&piece, chunk_size, chunk_overlap, rest));
        }
    }

    if !small.is_empty() {
        merge_pieces(&small, chunk_size, chunk_overlap, &mut chunks);
    }

    chunks
}

/// First separator in the list that occurs in `text` (the empty separator
/// always matches), plus the lower-priority remainder for recursion.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, leaving the separator prefixed to the piece that
/// follows it. Concatenating the returned pieces reproduces `text` exactly.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut parts = text.split(separator);
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    for part in parts {
        pieces.push(format!("{separator}{part}"));
    }
    pieces
}

/// Greedy window accumulation with overlap carry-back.
///
/// When flushing a window, trailing pieces totalling at most `chunk_overlap`
/// characters are kept as the start of the next window so neighboring chunks
/// share context.
fn merge_pieces(
    pieces: &[String],
    chunk_size: usize,
    chunk_overlap: usize,
    out: &mut Vec<String>,
) {
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);

        if total + len > chunk_size && !window.is_empty() {
            out.push(window.iter().copied().collect());
            while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                total -= char_len(window.front().unwrap());
                window.pop_front();
            }
        }

        window.push_back(piece.as_str());
        total += len;
    }

    if !window.is_empty() {
        out.push(window.iter().copied().collect());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assert that the chunks, read in order with overlaps intersected out,
    /// cover the original text exactly: every chunk is a substring that
    /// starts at or before the end of the coverage so far, and coverage
    /// reaches the end of the input with no gaps.
    fn assert_covers(text: &str, chunks: &[String]) {
        let mut end = 0usize;
        for chunk in chunks {
            let lo = end.saturating_sub(chunk.len());
            let p = (lo..=end)
                .rev()
                .find(|&p| text.get(p..p + chunk.len()) == Some(chunk.as_str()))
                .unwrap_or_else(|| {
                    panic!("chunk {:?} does not continue coverage at byte {}", chunk, end)
                });
            end = end.max(p + chunk.len());
        }
        assert_eq!(end, text.len(), "chunks do not cover the full text");
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_text("", 1000, 200).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("Hello, world!", 1000, 200);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_respects_chunk_size() {
        let text = (0..40)
            .map(|i| format!("Sentence number {i} about robot kinematics."))
            .collect::<Vec<_>>()
            .join(" ");
        for chunk in split_text(&text, 120, 20) {
            assert!(
                chunk.chars().count() <= 120,
                "chunk exceeds limit: {:?}",
                chunk
            );
        }
    }

    #[test]
    fn test_prefers_heading_boundaries() {
        let text = "\n## Sensors\n\nLidar and cameras.\n## Actuators\n\nMotors and servos.";
        let chunks = split_text(text, 40, 0);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().any(|c| c.starts_with("\n## Actuators")));
    }

    #[test]
    fn test_neighbors_share_overlap() {
        let words = (0..30)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&words, 50, 20);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let prev = &pair[0];
            let next = &pair[1];
            let shared = (1..=prev.len().min(next.len()))
                .rev()
                .find(|&k| prev.ends_with(&next[..k]));
            assert!(
                shared.is_some(),
                "no shared context between {:?} and {:?}",
                prev,
                next
            );
        }
    }

    #[test]
    fn test_reconstruction_is_exact() {
        let text = "# Intro\n\nFirst paragraph about ROS nodes.\n\nSecond paragraph about \
                    topics and services.\n## Simulation\n\nGazebo worlds.\nUnity scenes.\n\n\
                    Final thoughts on deployment.";
        let chunks = split_text(text, 60, 15);
        assert_covers(text, &chunks);
    }

    #[test]
    fn test_reconstruction_without_overlap() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = split_text(text, 18, 0);
        assert_covers(text, &chunks);
    }

    #[test]
    fn test_long_unbroken_token_hard_splits() {
        let token = "x".repeat(250);
        let chunks = split_text(&token, 100, 0);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(chunks.concat(), token);
    }

    #[test]
    fn test_oversized_paragraph_recurses_to_finer_separator() {
        let long_para = (0..20)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let text = format!("Short intro.\n\n{long_para}\n\nShort outro.");
        let chunks = split_text(&text, 40, 0);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "oversized: {:?}", chunk);
        }
        assert_covers(&text, &chunks);
    }

    #[test]
    fn test_multibyte_never_splits_inside_char() {
        let text = "数据处理流程 ".repeat(40);
        let chunks = split_text(&text, 25, 5);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 25);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = (0..15)
            .map(|i| format!("Paragraph {i} text.\n\n"))
            .collect::<String>();
        let a = split_text(&text, 50, 10);
        let b = split_text(&text, 50, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_count_matches_reference_sizes() {
        // 2500- and 800-character documents, chunk_size=1000, overlap=200:
        // the count must be stable across runs.
        let doc_a = "a".repeat(2400) + " tail words here";
        let doc_b = "paragraph one.\n\n".repeat(50);
        let count_a = split_text(&doc_a, 1000, 200).len();
        let count_b = split_text(&doc_b, 1000, 200).len();
        assert_eq!(count_a, split_text(&doc_a, 1000, 200).len());
        assert_eq!(count_b, split_text(&doc_b, 1000, 200).len());
        assert!(count_a >= 3);
        assert!(count_b >= 1);
    }
}
