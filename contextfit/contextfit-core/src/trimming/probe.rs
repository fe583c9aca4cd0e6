//! Binary-search probing for the largest trailing batch that fits a budget.

use std::collections::HashMap;

use super::options::TrimOptions;
use super::segment::{RenderMode, Segment};
use super::traits::{TokenCounter, TrimError};

/// A rendered, joined run of the last `count` segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// How many trailing segments the batch holds.
    pub count: usize,
    pub text: String,
    pub tokens: usize,
}

/// Per-call memo of rendered segments and counted batches.
///
/// Keyed by `(mode, count)` for batches and `(mode, index)` for individual
/// segments, so each batch is rendered and counted at most once and no segment
/// is rendered twice in the same mode. Create one per trim call: entries are
/// only valid for the segment slice and options they were built from.
#[derive(Debug, Default)]
pub struct RenderCache {
    batches: HashMap<(RenderMode, usize), ProbeResult>,
    segments: HashMap<(RenderMode, usize), String>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously probed batch of the last `count` segments, if any.
    pub fn batch(&self, mode: RenderMode, count: usize) -> Option<&ProbeResult> {
        self.batches.get(&(mode, count))
    }

    /// Number of batches counted so far.
    pub fn batches_probed(&self) -> usize {
        self.batches.len()
    }
}

/// Render one segment, honoring a renderer override in `options`.
pub async fn render_segment(
    segment: &Segment,
    mode: RenderMode,
    options: &TrimOptions,
) -> Result<String, TrimError> {
    match &options.renderer {
        Some(renderer) => renderer.render(segment, mode).await,
        None => segment.render(mode).await,
    }
}

pub(super) async fn render_cached(
    segments: &[Segment],
    index: usize,
    mode: RenderMode,
    options: &TrimOptions,
    cache: &mut RenderCache,
) -> Result<String, TrimError> {
    if let Some(text) = cache.segments.get(&(mode, index)) {
        return Ok(text.clone());
    }
    let text = render_segment(&segments[index], mode, options).await?;
    cache.segments.insert((mode, index), text.clone());
    Ok(text)
}

async fn build_batch<C>(
    segments: &[Segment],
    count: usize,
    mode: RenderMode,
    counter: &C,
    options: &TrimOptions,
    cache: &mut RenderCache,
) -> Result<ProbeResult, TrimError>
where
    C: TokenCounter + ?Sized,
{
    if let Some(batch) = cache.batch(mode, count) {
        return Ok(batch.clone());
    }

    let start = segments.len() - count;
    let mut parts = Vec::with_capacity(count);
    for index in start..segments.len() {
        parts.push(render_cached(segments, index, mode, options, cache).await?);
    }
    let text = options.joiner.join(&parts).await?;
    let tokens = counter.count_tokens(&text).await?;

    let batch = ProbeResult {
        count,
        text,
        tokens,
    };
    cache.batches.insert((mode, count), batch.clone());
    Ok(batch)
}

/// Find the largest `k` such that the last `k` segments, rendered in `mode`
/// and joined, fit within `token_limit`.
///
/// Fitting is monotonic in `k`, so a binary search over `[1, len]` needs
/// `O(log n)` counter calls. Returns `None` if not even the newest segment fits.
pub async fn probe_batch<C>(
    segments: &[Segment],
    token_limit: usize,
    mode: RenderMode,
    counter: &C,
    options: &TrimOptions,
    cache: &mut RenderCache,
) -> Result<Option<ProbeResult>, TrimError>
where
    C: TokenCounter + ?Sized,
{
    let mut low = 1;
    let mut high = segments.len();
    let mut best: Option<ProbeResult> = None;

    while low <= high {
        let mid = ((low + high) / 2).max(1);
        let batch = build_batch(segments, mid, mode, counter, options, cache).await?;
        let fits = batch.tokens <= token_limit;
        tracing::trace!(
            "Probe {:?}: last {} of {} segments -> {} tokens (limit {}, fits: {})",
            mode,
            mid,
            segments.len(),
            batch.tokens,
            token_limit,
            fits
        );

        if fits {
            best = Some(batch);
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    tracing::debug!(
        "Probe {:?} settled on {:?} of {} segments",
        mode,
        best.as_ref().map(|b| b.count),
        segments.len()
    );
    Ok(best)
}
