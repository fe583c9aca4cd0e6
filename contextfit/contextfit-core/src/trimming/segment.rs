//! Context segments and how they are rendered to text.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use super::traits::TrimError;

/// Which of a segment's two textual representations to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Full detail.
    Full,
    /// A shorter representation, e.g. a summary.
    Compact,
}

impl RenderMode {
    pub fn is_compact(self) -> bool {
        matches!(self, RenderMode::Compact)
    }
}

impl From<bool> for RenderMode {
    fn from(compact: bool) -> Self {
        if compact {
            RenderMode::Compact
        } else {
            RenderMode::Full
        }
    }
}

/// Content that knows how to render itself in full or compact form.
///
/// Rendering must be idempotent: the trimmer may ask for the same mode more
/// than once across calls. Errors abort the trim call that triggered them.
pub trait Render: Send + Sync {
    fn render(&self, mode: RenderMode) -> BoxFuture<'_, Result<String, TrimError>>;
}

/// One unit of content in the ordered input, oldest first.
#[derive(Clone)]
pub enum Segment {
    /// Plain text, rendered unchanged in both modes.
    Text(String),
    /// A value with its own full and compact renderings.
    Renderable(Arc<dyn Render>),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn renderable<R: Render + 'static>(value: R) -> Self {
        Segment::Renderable(Arc::new(value))
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self, Segment::Renderable(_))
    }

    /// Render without any renderer override.
    pub fn render(&self, mode: RenderMode) -> BoxFuture<'_, Result<String, TrimError>> {
        match self {
            Segment::Text(text) => Box::pin(future::ready(Ok(text.clone()))),
            Segment::Renderable(value) => value.render(mode),
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Segment::Renderable(_) => f.write_str("Renderable(..)"),
        }
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::Text(text)
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::Text(text.to_owned())
    }
}

impl From<Arc<dyn Render>> for Segment {
    fn from(value: Arc<dyn Render>) -> Self {
        Segment::Renderable(value)
    }
}

/// Overrides how every segment is turned into text.
///
/// Plain closures `Fn(&Segment, RenderMode) -> String` implement this trait;
/// implement it directly for async or fallible rendering.
pub trait SegmentRenderer: Send + Sync {
    fn render<'a>(
        &'a self,
        segment: &'a Segment,
        mode: RenderMode,
    ) -> BoxFuture<'a, Result<String, TrimError>>;
}

impl<F> SegmentRenderer for F
where
    F: Fn(&Segment, RenderMode) -> String + Send + Sync,
{
    fn render<'a>(
        &'a self,
        segment: &'a Segment,
        mode: RenderMode,
    ) -> BoxFuture<'a, Result<String, TrimError>> {
        Box::pin(future::ready(Ok((self)(segment, mode))))
    }
}

/// Normalized trim input: an ordered list of segments, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TrimInput(pub Vec<Segment>);

impl TrimInput {
    pub fn into_segments(self) -> Vec<Segment> {
        self.0
    }
}

impl From<Vec<Segment>> for TrimInput {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl From<Segment> for TrimInput {
    fn from(segment: Segment) -> Self {
        Self(vec![segment])
    }
}

impl From<String> for TrimInput {
    fn from(text: String) -> Self {
        Self(vec![Segment::Text(text)])
    }
}

impl From<&str> for TrimInput {
    fn from(text: &str) -> Self {
        Self(vec![Segment::from(text)])
    }
}

impl From<Vec<String>> for TrimInput {
    fn from(texts: Vec<String>) -> Self {
        Self(texts.into_iter().map(Segment::Text).collect())
    }
}

impl From<Vec<&str>> for TrimInput {
    fn from(texts: Vec<&str>) -> Self {
        Self(texts.into_iter().map(Segment::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TrimInput {
    fn from(texts: [&str; N]) -> Self {
        Self(texts.into_iter().map(Segment::from).collect())
    }
}

impl<T: Into<TrimInput>> From<Option<T>> for TrimInput {
    fn from(input: Option<T>) -> Self {
        input.map(Into::into).unwrap_or_default()
    }
}
