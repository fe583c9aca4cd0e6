//! Batch-probe trimming: fit the newest segments into a token budget.
//!
//! Whole trailing segments are preferred, first in full rendering, then in
//! compact rendering if that carries more. Only when not even the newest
//! segment fits is it truncated on its own.

use futures::future::BoxFuture;

use super::joiner::Joiner;
use super::options::TrimOptions;
use super::probe::{probe_batch, render_cached, render_segment, ProbeResult, RenderCache};
use super::segment::{RenderMode, Segment, SegmentRenderer, TrimInput};
use super::traits::{ContextTrimmer, TokenCounter, TrimError};
use super::truncation::truncate_to_fit;

/// Trim `input` to the largest suffix of segments that fits the token limit
/// in `options`.
///
/// `options` accepts a bare limit (`512usize`), a limit with a separator
/// (`(512usize, "\n\n")`) or a full [`TrimOptions`]. Without a positive limit
/// every segment is rendered in full and joined, and `counter` is never called.
///
/// Returns an empty string when nothing can be fit.
///
/// # Example
/// ```ignore
/// use contextfit::trimming::{trim_based_on_batch_probe, WordCountTokenCounter};
///
/// let text = trim_based_on_batch_probe(
///     vec!["a b", "c d", "e f", "g h", "i j"],
///     &WordCountTokenCounter,
///     5usize,
/// )
/// .await?;
/// assert_eq!(text, "g h\ni j");
/// ```
pub async fn trim_based_on_batch_probe<C>(
    input: impl Into<TrimInput>,
    counter: &C,
    options: impl Into<TrimOptions>,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let segments = input.into().into_segments();
    let options = options.into();
    trim_segments(&segments, counter, &options).await
}

/// [`trim_based_on_batch_probe`] over already-normalized segments.
pub async fn trim_segments<C>(
    segments: &[Segment],
    counter: &C,
    options: &TrimOptions,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let Some(token_limit) = options.effective_limit() else {
        return render_all(segments, options).await;
    };

    match segments {
        [] => Ok(String::new()),
        [single] => trim_single(single, token_limit, counter, options).await,
        _ => trim_many(segments, token_limit, counter, options).await,
    }
}

async fn render_all(segments: &[Segment], options: &TrimOptions) -> Result<String, TrimError> {
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        parts.push(render_segment(segment, RenderMode::Full, options).await?);
    }
    options.joiner.join(&parts).await
}

async fn trim_single<C>(
    segment: &Segment,
    token_limit: usize,
    counter: &C,
    options: &TrimOptions,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let full = render_segment(segment, RenderMode::Full, options).await?;
    if counter.count_tokens(&full).await? <= token_limit {
        return Ok(full);
    }

    let mut oversized = full;
    if segment.is_renderable() {
        let compact = render_segment(segment, RenderMode::Compact, options).await?;
        if counter.count_tokens(&compact).await? <= token_limit {
            return Ok(compact);
        }
        oversized = compact;
    }

    truncate_newest(&oversized, token_limit, counter, options).await
}

async fn trim_many<C>(
    segments: &[Segment],
    token_limit: usize,
    counter: &C,
    options: &TrimOptions,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let total = segments.len();
    let mut cache = RenderCache::new();

    let best_full = probe_batch(
        segments,
        token_limit,
        RenderMode::Full,
        counter,
        options,
        &mut cache,
    )
    .await?;

    let best_compact = match &best_full {
        Some(full) if full.count == total => None,
        _ => {
            probe_batch(
                segments,
                token_limit,
                RenderMode::Compact,
                counter,
                options,
                &mut cache,
            )
            .await?
        }
    };

    let chosen = if prefer_compact(best_full.as_ref(), best_compact.as_ref()) {
        best_compact.map(|batch| (RenderMode::Compact, batch))
    } else {
        best_full.map(|batch| (RenderMode::Full, batch))
    };

    if let Some((mode, batch)) = chosen {
        if batch.count < total {
            tracing::info!(
                "Kept last {} of {} segments in {:?} mode ({} tokens, limit {})",
                batch.count,
                total,
                mode,
                batch.tokens,
                token_limit
            );
        }
        return Ok(batch.text);
    }

    let newest_index = total - 1;
    let mode = if segments[newest_index].is_renderable() {
        RenderMode::Compact
    } else {
        RenderMode::Full
    };
    tracing::debug!(
        "No whole segment fits {} tokens; truncating newest segment in {:?} mode",
        token_limit,
        mode
    );
    let newest = render_cached(segments, newest_index, mode, options, &mut cache).await?;
    truncate_newest(&newest, token_limit, counter, options).await
}

/// Compact wins when it keeps more segments, or the same number with more text.
///
/// Text length is compared in characters, not tokens.
fn prefer_compact(full: Option<&ProbeResult>, compact: Option<&ProbeResult>) -> bool {
    match (full, compact) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(full), Some(compact)) => {
            compact.count > full.count
                || (compact.count == full.count
                    && compact.text.chars().count() > full.text.chars().count())
        }
    }
}

async fn truncate_newest<C>(
    text: &str,
    token_limit: usize,
    counter: &C,
    options: &TrimOptions,
) -> Result<String, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let truncated = truncate_to_fit(text, token_limit, counter, options).await?;
    if truncated.is_empty() {
        tracing::warn!(
            "Could not fit any content into {} tokens; returning empty context",
            token_limit
        );
    }
    Ok(truncated)
}

/// A reusable trimmer bundling a token counter with trim options.
///
/// # Example
/// ```ignore
/// use contextfit::trimming::{BatchProbeTrimmer, HeuristicTokenCounter};
///
/// let trimmer = BatchProbeTrimmer::new(HeuristicTokenCounter)
///     .with_token_limit(4096)
///     .with_separator("\n\n");
/// let context = trimmer.trim(history).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BatchProbeTrimmer<C> {
    counter: C,
    options: TrimOptions,
}

impl<C: TokenCounter> BatchProbeTrimmer<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            options: TrimOptions::default(),
        }
    }

    pub fn with_options(mut self, options: impl Into<TrimOptions>) -> Self {
        self.options = options.into();
        self
    }

    pub fn with_token_limit(mut self, token_limit: usize) -> Self {
        self.options.token_limit = Some(token_limit);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.options.joiner = Joiner::Separator(separator.into());
        self
    }

    pub fn with_joiner(mut self, joiner: impl Into<Joiner>) -> Self {
        self.options.joiner = joiner.into();
        self
    }

    pub fn with_renderer<R: SegmentRenderer + 'static>(mut self, renderer: R) -> Self {
        self.options = self.options.renderer(renderer);
        self
    }

    pub fn with_punctuation_chunking(mut self, enabled: bool) -> Self {
        self.options.try_chunking_by_punctuation = enabled;
        self
    }

    pub fn with_hard_truncation(mut self, enabled: bool) -> Self {
        self.options.try_hard_truncation = enabled;
        self
    }

    pub fn options(&self) -> &TrimOptions {
        &self.options
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub async fn trim(&self, input: impl Into<TrimInput>) -> Result<String, TrimError> {
        let segments = input.into().into_segments();
        trim_segments(&segments, &self.counter, &self.options).await
    }
}

impl<C: TokenCounter> ContextTrimmer for BatchProbeTrimmer<C> {
    type Input = TrimInput;

    fn trim(&self, input: TrimInput) -> BoxFuture<'_, Result<String, TrimError>> {
        Box::pin(async move { trim_segments(&input.0, &self.counter, &self.options).await })
    }

    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>> {
        self.counter.count_tokens(text)
    }
}
