//! Trim options and their serializable configuration form.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::joiner::{Joiner, DEFAULT_SEPARATOR};
use super::segment::SegmentRenderer;
use super::traits::TrimError;

/// Options for a single trim call.
///
/// # Example
/// ```ignore
/// use contextfit::trimming::TrimOptions;
///
/// let options = TrimOptions::with_limit(2048)
///     .separator("\n\n")
///     .try_hard_truncation(false);
/// ```
#[derive(Clone)]
pub struct TrimOptions {
    /// Token budget. `None` or `Some(0)` disables trimming entirely.
    pub token_limit: Option<usize>,
    pub joiner: Joiner,
    /// Overrides how every segment is rendered, plain text included.
    pub renderer: Option<Arc<dyn SegmentRenderer>>,
    pub try_chunking_by_punctuation: bool,
    pub try_hard_truncation: bool,
}

impl TrimOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with only a token limit set.
    pub fn with_limit(token_limit: usize) -> Self {
        Self::default().token_limit(token_limit)
    }

    pub fn token_limit(mut self, token_limit: usize) -> Self {
        self.token_limit = Some(token_limit);
        self
    }

    pub fn joiner(mut self, joiner: impl Into<Joiner>) -> Self {
        self.joiner = joiner.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.joiner = Joiner::Separator(separator.into());
        self
    }

    pub fn renderer<R: SegmentRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn try_chunking_by_punctuation(mut self, enabled: bool) -> Self {
        self.try_chunking_by_punctuation = enabled;
        self
    }

    pub fn try_hard_truncation(mut self, enabled: bool) -> Self {
        self.try_hard_truncation = enabled;
        self
    }

    /// The limit to trim against, or `None` when trimming is bypassed.
    pub fn effective_limit(&self) -> Option<usize> {
        self.token_limit.filter(|limit| *limit > 0)
    }
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            token_limit: None,
            joiner: Joiner::default(),
            renderer: None,
            try_chunking_by_punctuation: true,
            try_hard_truncation: true,
        }
    }
}

impl fmt::Debug for TrimOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrimOptions")
            .field("token_limit", &self.token_limit)
            .field("joiner", &self.joiner)
            .field("renderer", &self.renderer.as_ref().map(|_| ".."))
            .field("try_chunking_by_punctuation", &self.try_chunking_by_punctuation)
            .field("try_hard_truncation", &self.try_hard_truncation)
            .finish()
    }
}

impl From<usize> for TrimOptions {
    fn from(token_limit: usize) -> Self {
        Self::with_limit(token_limit)
    }
}

impl From<(usize, &str)> for TrimOptions {
    fn from((token_limit, separator): (usize, &str)) -> Self {
        Self::with_limit(token_limit).separator(separator)
    }
}

impl From<Option<usize>> for TrimOptions {
    fn from(token_limit: Option<usize>) -> Self {
        Self {
            token_limit,
            ..Self::default()
        }
    }
}

/// Serializable trim configuration, e.g. loaded from an application config file.
///
/// Zero and negative limits both mean "no trimming".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub token_limit: Option<i64>,
    pub separator: String,
    pub try_chunking_by_punctuation: bool,
    pub try_hard_truncation: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            token_limit: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            try_chunking_by_punctuation: true,
            try_hard_truncation: true,
        }
    }
}

impl TrimConfig {
    pub fn from_json(json: &str) -> Result<Self, TrimError> {
        serde_json::from_str(json).map_err(|e| TrimError::InvalidConfig(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, TrimError> {
        serde_json::from_value(value).map_err(|e| TrimError::InvalidConfig(e.to_string()))
    }
}

impl From<TrimConfig> for TrimOptions {
    fn from(config: TrimConfig) -> Self {
        Self {
            token_limit: config
                .token_limit
                .and_then(|limit| usize::try_from(limit).ok())
                .filter(|limit| *limit > 0),
            joiner: Joiner::Separator(config.separator),
            renderer: None,
            try_chunking_by_punctuation: config.try_chunking_by_punctuation,
            try_hard_truncation: config.try_hard_truncation,
        }
    }
}
