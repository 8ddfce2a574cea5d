//! Rendered-HTML cache seam.

/// Cache of rendered client HTML, which embeds registered plugin assets.
pub trait TemplateCache: Send + Sync + std::fmt::Debug + 'static {
    /// Drops every cached page.
    fn invalidate(&self);
}

/// Template cache for hosts that render nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopTemplateCache;

impl TemplateCache for NoopTemplateCache {
    fn invalidate(&self) {}
}
