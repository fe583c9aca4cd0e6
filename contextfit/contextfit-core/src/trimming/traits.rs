//! Core traits for token-budget trimming.

use std::future::Future;

use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrimError {
    #[error("Token counting failed: {0}")]
    TokenCountFailed(String),
    #[error("Rendering failed: {0}")]
    RenderFailed(String),
    #[error("Joining failed: {0}")]
    JoinFailed(String),
    #[error("Invalid trim configuration: {0}")]
    InvalidConfig(String),
}

/// The token oracle consulted by the trimmer.
///
/// Implementations must be deterministic for equal input text within a
/// single trim call. Any error is propagated to the caller unchanged.
///
/// Async closures of the shape `Fn(String) -> impl Future<Output = Result<usize, TrimError>>`
/// implement this trait, which keeps test mocks and ad-hoc tokenizers short.
pub trait TokenCounter: Send + Sync {
    /// Count the tokens `text` occupies.
    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>>;
}

impl<F, Fut> TokenCounter for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<usize, TrimError>> + Send + 'static,
{
    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>> {
        Box::pin((self)(text.to_owned()))
    }
}

/// Trait for pluggable trimming strategies over ordered context segments.
pub trait ContextTrimmer: Send + Sync {
    /// The segment sequence this trimmer accepts.
    type Input: Send;

    /// Trim `input` into a single string that fits the configured budget.
    ///
    /// Returns an empty string when nothing could be fit.
    fn trim(&self, input: Self::Input) -> BoxFuture<'_, Result<String, TrimError>>;

    /// Count the tokens a piece of already-rendered text occupies.
    fn count_tokens<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, TrimError>>;

    /// Check if trimming is needed for `text` under `max_tokens`.
    fn needs_trimming<'a>(
        &'a self,
        text: &'a str,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<bool, TrimError>> {
        Box::pin(async move { Ok(self.count_tokens(text).await? > max_tokens) })
    }
}
