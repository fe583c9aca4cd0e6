use std::sync::Mutex;

use contextfit::trimming::{
    trim_based_on_batch_probe, truncate_hard_tail, Render, RenderMode, Segment, TokenCounter,
    TrimError, TrimInput, TrimOptions, MAX_HARD_TRUNCATION_ATTEMPTS,
};
use futures::future::{self, BoxFuture};

/// Word-count oracle that records every text it is asked about.
#[derive(Default)]
struct RecordingCounter {
    calls: Mutex<Vec<String>>,
}

impl RecordingCounter {
    fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TokenCounter for RecordingCounter {
    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>> {
        self.calls.lock().unwrap().push(text.to_string());
        Box::pin(future::ready(Ok(text.split_whitespace().count())))
    }
}

/// Character-based oracle, four characters per token.
struct CharCounter;

impl TokenCounter for CharCounter {
    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>> {
        Box::pin(future::ready(Ok(text.chars().count().div_ceil(4))))
    }
}

struct Buildable {
    full: String,
    compact: String,
}

impl Render for Buildable {
    fn render(&self, mode: RenderMode) -> BoxFuture<'_, Result<String, TrimError>> {
        let text = match mode {
            RenderMode::Full => self.full.clone(),
            RenderMode::Compact => self.compact.clone(),
        };
        Box::pin(async move { Ok(text) })
    }
}

fn buildable(full: &str, compact: &str) -> Segment {
    Segment::renderable(Buildable {
        full: full.to_string(),
        compact: compact.to_string(),
    })
}

#[tokio::test]
async fn both_messages_fit() {
    let counter = RecordingCounter::default();
    let out = trim_based_on_batch_probe(vec!["older message", "newer message"], &counter, 10usize)
        .await
        .unwrap();
    assert_eq!(out, "older message\nnewer message");
}

#[tokio::test]
async fn keeps_only_newest_that_fit() {
    let counter = RecordingCounter::default();
    let out = trim_based_on_batch_probe(vec!["a b", "c d", "e f", "g h", "i j"], &counter, 5usize)
        .await
        .unwrap();
    assert_eq!(out, "g h\ni j");
}

#[tokio::test]
async fn single_sentence_falls_back_to_punctuation() {
    let counter = RecordingCounter::default();
    let text = "Older sentence should be dropped. Newest sentence should stay intact. trailing tail";
    let out = trim_based_on_batch_probe(text, &counter, 4usize).await.unwrap();
    assert_eq!(out, "trailing tail");
    assert!(text.ends_with(&out));
}

#[tokio::test]
async fn single_long_token_is_hard_truncated() {
    let text = "q".repeat(97);
    let options = TrimOptions::with_limit(3).try_hard_truncation(true);
    let out = trim_based_on_batch_probe(text.as_str(), &CharCounter, options)
        .await
        .unwrap();
    assert!(!out.is_empty());
    assert!(out.len() < text.len());
    assert!(text.ends_with(&out));
}

#[tokio::test]
async fn single_long_token_without_hard_truncation_is_empty() {
    let text = "q".repeat(97);
    let options = TrimOptions::with_limit(3).try_hard_truncation(false);
    let out = trim_based_on_batch_probe(text.as_str(), &CharCounter, options)
        .await
        .unwrap();
    assert_eq!(out, "");
}

#[tokio::test]
async fn empty_input_is_empty_output() {
    let counter = RecordingCounter::default();
    let empty: Vec<Segment> = Vec::new();
    assert_eq!(trim_based_on_batch_probe(empty, &counter, 10usize).await.unwrap(), "");
    assert_eq!(
        trim_based_on_batch_probe(None::<Segment>, &counter, 10usize)
            .await
            .unwrap(),
        ""
    );
    assert_eq!(
        trim_based_on_batch_probe(TrimInput::default(), &counter, TrimOptions::default())
            .await
            .unwrap(),
        ""
    );
    assert_eq!(counter.calls(), 0);
}

#[tokio::test]
async fn compact_batch_wins_when_it_keeps_more() {
    let counter = RecordingCounter::default();
    let input = vec![
        buildable("first full render", "first"),
        buildable("second full render", "second"),
        buildable("third full render", "third"),
    ];
    let out = trim_based_on_batch_probe(input, &counter, 5usize).await.unwrap();
    assert_eq!(out, "first\nsecond\nthird");
}

#[tokio::test]
async fn bypass_joins_full_renders_without_counting() {
    let counter = RecordingCounter::default();
    let input = vec![
        buildable("first full render", "first"),
        Segment::text("plain"),
        buildable("third full render", "third"),
    ];
    let out = trim_based_on_batch_probe(input, &counter, TrimOptions::new().separator(" / "))
        .await
        .unwrap();
    assert_eq!(out, "first full render / plain / third full render");
    assert_eq!(counter.calls(), 0);
}

#[tokio::test]
async fn single_segment_that_fits_is_verbatim() {
    let counter = RecordingCounter::default();
    let text = "  spacing\tand punctuation, kept as-is.  ";
    let out = trim_based_on_batch_probe(text, &counter, 100usize).await.unwrap();
    assert_eq!(out, text);
    assert_eq!(counter.calls(), 1);
}

#[tokio::test]
async fn result_is_always_a_trailing_batch() {
    let segments: Vec<String> = (0..20).map(|i| format!("m{i} x")).collect();
    for limit in 2..=45usize {
        let counter = RecordingCounter::default();
        let out = trim_based_on_batch_probe(segments.clone(), &counter, limit)
            .await
            .unwrap();
        let kept = if out.is_empty() { 0 } else { out.split('\n').count() };
        let expected: Vec<String> = segments[segments.len() - kept..].to_vec();
        assert_eq!(out, expected.join("\n"), "limit {limit}");
    }
}

#[tokio::test]
async fn more_budget_never_keeps_fewer_segments() {
    let segments: Vec<String> = (0..13)
        .map(|i| "w ".repeat(i % 4 + 1).trim_end().to_string())
        .collect();
    let mut previous = 0;
    for limit in 1..=40usize {
        let counter = RecordingCounter::default();
        let out = trim_based_on_batch_probe(segments.clone(), &counter, limit)
            .await
            .unwrap();
        let kept = if out.is_empty() { 0 } else { out.split('\n').count() };
        assert!(kept >= previous, "limit {limit}: kept {kept} < {previous}");
        previous = kept;
    }
}

#[tokio::test]
async fn probing_uses_logarithmic_counter_calls() {
    let segments: Vec<String> = (0..100).map(|i| format!("s{i}")).collect();
    let counter = RecordingCounter::default();
    let out = trim_based_on_batch_probe(segments, &counter, 30usize).await.unwrap();
    assert_eq!(out.split('\n').count(), 30);
    // Two probes (full, then compact) of at most ceil(log2(101)) steps each.
    assert!(counter.calls() <= 14, "got {} calls", counter.calls());
}

#[tokio::test]
async fn hard_tail_spends_at_most_five_calls() {
    let counter = RecordingCounter::default();
    let text = "word ".repeat(500);
    let out = truncate_hard_tail(&text, 1, &counter).await.unwrap();
    assert!(counter.calls() <= MAX_HARD_TRUNCATION_ATTEMPTS);
    assert!(text.trim().ends_with(&out));
}

#[tokio::test]
async fn counter_failure_is_not_swallowed() {
    let counter =
        |_text: String| async { Err::<usize, TrimError>(TrimError::TokenCountFailed("429".into())) };
    let err = trim_based_on_batch_probe(vec!["a", "b"], &counter, 5usize)
        .await
        .unwrap_err();
    assert!(matches!(err, TrimError::TokenCountFailed(msg) if msg == "429"));
}
