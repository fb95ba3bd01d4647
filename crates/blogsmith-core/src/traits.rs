use std::future::Future;

use crate::error::AppError;
use crate::models::Article;
use crate::publish::{PostPayload, PublishCredentials, PublishResult};

/// Turns a topic into a generated article.
pub trait ContentGenerator: Send + Sync + Clone {
    /// Generate one article for `topic`.
    ///
    /// `repetition_index` tells the generator which occurrence of the topic
    /// this is; `instruction` is free text appended to the prompt verbatim.
    fn generate(
        &self,
        topic: &str,
        repetition_index: Option<u32>,
        instruction: Option<&str>,
    ) -> impl Future<Output = Result<Article, AppError>> + Send;
}

/// Creates posts on a remote content-management endpoint.
///
/// Credentials are passed on every call so one publisher can serve any
/// number of independent sessions.
pub trait Publisher: Send + Sync + Clone {
    /// Lightweight authenticated read used to validate credentials.
    fn probe(
        &self,
        credentials: &PublishCredentials,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Create one post. Failures come back as [`PublishResult::Failed`],
    /// never as an error.
    fn publish(
        &self,
        credentials: &PublishCredentials,
        post: &PostPayload,
    ) -> impl Future<Output = PublishResult> + Send;
}
