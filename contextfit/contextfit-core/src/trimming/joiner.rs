//! Combining rendered segments into one string.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use super::traits::TrimError;

pub const DEFAULT_SEPARATOR: &str = "\n";

/// Custom join strategy.
///
/// Plain closures `Fn(&[String]) -> String` implement this trait; implement it
/// directly when joining is async or can fail.
pub trait Join: Send + Sync {
    fn join<'a>(&'a self, parts: &'a [String]) -> BoxFuture<'a, Result<String, TrimError>>;
}

impl<F> Join for F
where
    F: Fn(&[String]) -> String + Send + Sync,
{
    fn join<'a>(&'a self, parts: &'a [String]) -> BoxFuture<'a, Result<String, TrimError>> {
        Box::pin(future::ready(Ok((self)(parts))))
    }
}

#[derive(Clone)]
pub enum Joiner {
    Separator(String),
    Custom(Arc<dyn Join>),
}

impl Joiner {
    pub fn separator(separator: impl Into<String>) -> Self {
        Joiner::Separator(separator.into())
    }

    pub fn custom<J: Join + 'static>(join: J) -> Self {
        Joiner::Custom(Arc::new(join))
    }

    /// Join `parts` in order. An empty slice joins to an empty string.
    pub async fn join(&self, parts: &[String]) -> Result<String, TrimError> {
        match self {
            Joiner::Separator(separator) => Ok(parts.join(separator.as_str())),
            Joiner::Custom(join) => join.join(parts).await,
        }
    }
}

impl Default for Joiner {
    fn default() -> Self {
        Joiner::Separator(DEFAULT_SEPARATOR.to_string())
    }
}

impl fmt::Debug for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Joiner::Separator(separator) => f.debug_tuple("Separator").field(separator).finish(),
            Joiner::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<&str> for Joiner {
    fn from(separator: &str) -> Self {
        Joiner::separator(separator)
    }
}

impl From<String> for Joiner {
    fn from(separator: String) -> Self {
        Joiner::Separator(separator)
    }
}
