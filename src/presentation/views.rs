use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::domain::entities::{ContentItem, ContentTypeSummary};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }

    /// Module path of the call site that failed to render.
    pub fn origin(&self) -> &'static str {
        self.source
    }
}

#[derive(Template)]
#[template(path = "site_counts/fragment.html")]
pub struct SiteCountsTemplate<'a> {
    pub css_class_name: &'a str,
    pub summaries: &'a [ContentTypeSummary],
    pub current_item_id: u64,
    pub items: &'a [ContentItem],
}

/// Render the site counts fragment.
///
/// Pure: identical inputs always yield identical markup. The class name,
/// display names and titles are HTML-escaped by the template.
pub fn render_fragment(
    css_class_name: &str,
    summaries: &[ContentTypeSummary],
    current_item_id: u64,
    items: &[ContentItem],
) -> Result<String, TemplateRenderError> {
    SiteCountsTemplate {
        css_class_name,
        summaries,
        current_item_id,
        items,
    }
    .render()
    .map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_fragment",
            "Fragment rendering failed",
            err,
        )
    })
}
