//! Token-budget trimming of ordered context segments.
//!
//! This module fits conversation history, tool output and retrieved context
//! into a fixed token budget. The newest segments are kept whole where
//! possible, compact renderings are used when they carry more, and only the
//! newest segment is ever cut, preferring punctuation boundaries.

mod batch;
mod estimator;
mod joiner;
mod options;
mod probe;
mod segment;
mod traits;
mod truncation;

pub use batch::{trim_based_on_batch_probe, trim_segments, BatchProbeTrimmer};
pub use estimator::{count_words, estimate_tokens, HeuristicTokenCounter, WordCountTokenCounter};
pub use joiner::{Join, Joiner, DEFAULT_SEPARATOR};
pub use options::{TrimConfig, TrimOptions};
pub use probe::{probe_batch, render_segment, ProbeResult, RenderCache};
pub use segment::{Render, RenderMode, Segment, SegmentRenderer, TrimInput};
pub use traits::{ContextTrimmer, TokenCounter, TrimError};
pub use truncation::{
    split_after_punctuation, truncate_by_punctuation, truncate_hard_tail, truncate_to_fit,
    MAX_HARD_TRUNCATION_ATTEMPTS,
};
