use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::RepoError, infra::error::InfraError,
    infra::seed::SeedError, presentation::views::TemplateRenderError,
};

/// Failure surfaced by [`crate::application::site_counts::SiteCountsService::render`].
///
/// None of these are ever written to the cache.
#[derive(Debug, Error)]
pub enum SiteCountsError {
    #[error("content repository unavailable")]
    RepositoryUnavailable(#[source] RepoError),
    #[error("malformed repository result: {message}")]
    MalformedFilterResult { message: String },
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

impl SiteCountsError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFilterResult {
            message: message.into(),
        }
    }
}

impl From<RepoError> for SiteCountsError {
    fn from(err: RepoError) -> Self {
        Self::RepositoryUnavailable(err)
    }
}

/// Collect an error and its sources into display strings, outermost first.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Render(#[from] SiteCountsError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
