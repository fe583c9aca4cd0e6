//! Fit LLM context into a token budget.
//!
//! `contextfit` trims an ordered list of context segments (oldest first) down
//! to the largest trailing run whose joined rendering fits a token limit. Token
//! counting is delegated to a caller-supplied async [`trimming::TokenCounter`],
//! so any tokenizer or remote counting endpoint can be plugged in.
//!
//! # Example
//! ```ignore
//! use contextfit::trimming::{trim_based_on_batch_probe, HeuristicTokenCounter, TrimOptions};
//!
//! let context = trim_based_on_batch_probe(
//!     history,
//!     &HeuristicTokenCounter,
//!     TrimOptions::with_limit(4096).separator("\n\n"),
//! )
//! .await?;
//! ```

pub mod trimming;

pub use trimming::{trim_based_on_batch_probe, TrimError, TrimOptions};
