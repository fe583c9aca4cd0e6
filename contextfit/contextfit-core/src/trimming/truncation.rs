//! Tail truncation of a single oversized string.
//!
//! Two strategies, tried in order:
//! - punctuation chunking keeps whole trailing sentences/elements, so XML,
//!   JSON and prose are not cut mid-token;
//! - hard tail truncation keeps a trailing character window, shrinking it
//!   geometrically until it fits.
//!
//! Both only ever keep the end of the input: the newest content survives.

use std::sync::OnceLock;

use regex::Regex;

use super::options::TrimOptions;
use super::traits::{TokenCounter, TrimError};

/// Rough characters per token used to size the first hard truncation window.
const HARD_TRUNCATION_CHARS_PER_TOKEN: usize = 4;

/// Each hard truncation retry keeps this fraction of the previous window.
const HARD_TRUNCATION_SHRINK_FACTOR: f64 = 0.75;

/// Upper bound on token counter calls made by [`truncate_hard_tail`].
pub const MAX_HARD_TRUNCATION_ATTEMPTS: usize = 5;

fn punctuation() -> &'static Regex {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    PUNCTUATION.get_or_init(|| Regex::new(r"\p{P}").expect("punctuation pattern is valid"))
}

/// Split `text` right after every Unicode punctuation character.
///
/// Pieces are trimmed and empty pieces are dropped.
pub fn split_after_punctuation(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for found in punctuation().find_iter(text) {
        pieces.push(text[start..found.end()].trim());
        start = found.end();
    }
    pieces.push(text[start..].trim());
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Keep the longest run of trailing punctuation-delimited pieces that fits.
///
/// Pieces are re-joined with a single space. Returns an empty string when the
/// text has no interior boundary or not even the last piece fits.
pub async fn truncate_by_punctuation<C>(
    text: &str,
    token_limit: usize,
    counter: &C,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let pieces = split_after_punctuation(text);
    if pieces.len() <= 1 {
        return Ok(String::new());
    }

    let total = pieces.len();
    for keep in (1..=total).rev() {
        let candidate = pieces[total - keep..].join(" ");
        let tokens = counter.count_tokens(&candidate).await?;
        tracing::trace!(
            "Punctuation truncation: last {} of {} pieces -> {} tokens (limit {})",
            keep,
            total,
            tokens,
            token_limit
        );
        if tokens <= token_limit {
            return Ok(candidate);
        }
    }

    Ok(String::new())
}

/// The last `count` characters of `text`.
fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Keep a trailing character window of `text`, shrinking it until it fits.
///
/// The first window is `token_limit * 4` characters. Each retry keeps 75% of
/// the previous window (always at least one character fewer, never below one).
/// At most [`MAX_HARD_TRUNCATION_ATTEMPTS`] counter calls are made; the last
/// candidate is returned even if it is still over budget.
pub async fn truncate_hard_tail<C>(
    text: &str,
    token_limit: usize,
    counter: &C,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let window = token_limit
        .saturating_mul(HARD_TRUNCATION_CHARS_PER_TOKEN)
        .max(1);
    let mut candidate = tail_chars(trimmed, window);

    for attempt in 1..=MAX_HARD_TRUNCATION_ATTEMPTS {
        let tokens = counter.count_tokens(candidate).await?;
        if tokens <= token_limit {
            return Ok(candidate.to_string());
        }

        let len = candidate.chars().count();
        let shrunk = ((len as f64 * HARD_TRUNCATION_SHRINK_FACTOR).floor() as usize)
            .min(len.saturating_sub(1))
            .max(1);
        tracing::trace!(
            "Hard truncation attempt {}: {} chars -> {} tokens, shrinking to {} chars",
            attempt,
            len,
            tokens,
            shrunk
        );
        candidate = tail_chars(candidate, shrunk);
    }

    tracing::warn!(
        "Hard truncation gave up after {} attempts; returning {} chars that may exceed {} tokens",
        MAX_HARD_TRUNCATION_ATTEMPTS,
        candidate.chars().count(),
        token_limit
    );
    Ok(candidate.to_string())
}

/// Make one rendered string fit `token_limit`.
///
/// Returns `text` unchanged if it already fits, otherwise the first non-empty
/// result of the fallbacks enabled in `options`, or an empty string.
pub async fn truncate_to_fit<C>(
    text: &str,
    token_limit: usize,
    counter: &C,
    options: &TrimOptions,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    if counter.count_tokens(text).await? <= token_limit {
        return Ok(text.to_string());
    }

    if options.try_chunking_by_punctuation {
        let chunked = truncate_by_punctuation(text, token_limit, counter).await?;
        if !chunked.is_empty() {
            tracing::debug!("Truncated by punctuation to {} chars", chunked.chars().count());
            return Ok(chunked);
        }
    }

    if options.try_hard_truncation {
        let hard = truncate_hard_tail(text, token_limit, counter).await?;
        if !hard.is_empty() {
            tracing::debug!("Hard-truncated to {} chars", hard.chars().count());
            return Ok(hard);
        }
    }

    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::trimming::estimator::{HeuristicTokenCounter, WordCountTokenCounter};

    #[test]
    fn test_split_after_punctuation() {
        let pieces = split_after_punctuation("First one. Second, part! tail");
        assert_eq!(pieces, vec!["First one.", "Second,", "part!", "tail"]);
    }

    #[test]
    fn test_split_drops_empty_pieces() {
        let pieces = split_after_punctuation("...  a  ");
        assert_eq!(pieces, vec![".", ".", ".", "a"]);
        assert!(split_after_punctuation("   ").is_empty());
    }

    #[test]
    fn test_split_unicode_punctuation() {
        let pieces = split_after_punctuation("最初の文。次の文「引用」");
        assert_eq!(pieces, vec!["最初の文。", "次の文「", "引用」"]);
    }

    #[test]
    fn test_tail_chars_respects_char_boundaries() {
        assert_eq!(tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[tokio::test]
    async fn test_punctuation_keeps_trailing_pieces() {
        let text = "Older sentence should be dropped. Newest sentence should stay intact. trailing tail";
        let out = truncate_by_punctuation(text, 4, &WordCountTokenCounter)
            .await
            .unwrap();
        assert_eq!(out, "trailing tail");

        let out = truncate_by_punctuation(text, 8, &WordCountTokenCounter)
            .await
            .unwrap();
        assert_eq!(out, "Newest sentence should stay intact. trailing tail");
    }

    #[tokio::test]
    async fn test_punctuation_without_boundary_gives_up() {
        let out = truncate_by_punctuation("no boundaries here at all", 2, &WordCountTokenCounter)
            .await
            .unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_punctuation_nothing_fits() {
        let out = truncate_by_punctuation("one two three. four five six", 2, &WordCountTokenCounter)
            .await
            .unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_hard_tail_returns_strict_suffix() {
        let text = "x".repeat(200);
        let out = truncate_hard_tail(&text, 3, &HeuristicTokenCounter)
            .await
            .unwrap();
        assert!(!out.is_empty());
        assert!(out.len() < text.len());
        assert!(text.ends_with(&out));
        assert!(estimate_fits(&out, 3));
    }

    fn estimate_fits(text: &str, limit: usize) -> bool {
        crate::trimming::estimator::estimate_tokens(text) <= limit
    }

    #[tokio::test]
    async fn test_hard_tail_is_bounded() {
        let calls = AtomicUsize::new(0);
        // Never fits, so every attempt is spent.
        let counter = |_text: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<usize, TrimError>(usize::MAX) }
        };
        let text = "y".repeat(10_000);
        let out = truncate_hard_tail(&text, 10, &counter).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), MAX_HARD_TRUNCATION_ATTEMPTS);
        // 40 -> 30 -> 22 -> 16 -> 12 -> 9
        assert_eq!(out.len(), 9);
        assert!(text.ends_with(&out));
    }

    #[tokio::test]
    async fn test_hard_tail_empty_input() {
        let out = truncate_hard_tail("   ", 5, &HeuristicTokenCounter).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_truncate_to_fit_unchanged_when_fitting() {
        let options = TrimOptions::default();
        let out = truncate_to_fit("short text", 5, &WordCountTokenCounter, &options)
            .await
            .unwrap();
        assert_eq!(out, "short text");
    }

    #[tokio::test]
    async fn test_truncate_to_fit_falls_through_to_hard() {
        let options = TrimOptions::default();
        let text = "z".repeat(120);
        let out = truncate_to_fit(&text, 3, &HeuristicTokenCounter, &options)
            .await
            .unwrap();
        assert!(!out.is_empty());
        assert!(out.len() < text.len());
    }

    #[tokio::test]
    async fn test_truncate_to_fit_all_disabled() {
        let options = TrimOptions::default()
            .try_chunking_by_punctuation(false)
            .try_hard_truncation(false);
        let out = truncate_to_fit("a b c. d e f", 1, &WordCountTokenCounter, &options)
            .await
            .unwrap();
        assert_eq!(out, "");
    }
}
