use tokio::sync::watch;

use crate::error::AppError;
use crate::models::Article;
use crate::publish::{PublishCredentials, PublishResult, Visibility};
use crate::publishing::{PublishConfig, PublishOrchestrator, PublishReporter, PublishSnapshot};
use crate::traits::Publisher;

/// Credentials plus the connectivity gate in front of batch publishing.
///
/// Publishing is refused until [`PublishSession::probe`] has succeeded for
/// the current credentials. Replacing the credentials closes the gate again.
pub struct PublishSession<P: Publisher> {
    credentials: PublishCredentials,
    verified: bool,
    orchestrator: PublishOrchestrator<P>,
}

impl<P: Publisher> PublishSession<P> {
    pub fn new(publisher: P, credentials: PublishCredentials, config: PublishConfig) -> Self {
        Self {
            credentials,
            verified: false,
            orchestrator: PublishOrchestrator::new(publisher, config),
        }
    }

    pub fn credentials(&self) -> &PublishCredentials {
        &self.credentials
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishSnapshot> {
        self.orchestrator.subscribe()
    }

    /// Swap in new credentials. Any earlier probe result no longer applies.
    pub fn set_credentials(&mut self, credentials: PublishCredentials) {
        if credentials != self.credentials {
            tracing::debug!(site = %credentials.site_url(), "Credentials changed, verification reset");
        }
        self.credentials = credentials;
        self.verified = false;
    }

    /// Validate the current credentials against the target.
    ///
    /// A failed probe leaves the session unverified and may be retried.
    pub async fn probe(&mut self) -> Result<(), AppError> {
        let outcome = self
            .orchestrator
            .publisher()
            .probe(&self.credentials)
            .await;
        self.verified = outcome.is_ok();

        match &outcome {
            Ok(()) => tracing::info!(site = %self.credentials.site_url(), "Connection verified"),
            Err(e) => tracing::warn!(site = %self.credentials.site_url(), error = %e, "Connection check failed"),
        }
        outcome
    }

    /// Publish `articles` in order; see [`PublishOrchestrator::publish_all`].
    pub async fn publish_all<R: PublishReporter>(
        &self,
        articles: &[Article],
        visibility: Visibility,
        reporter: &R,
    ) -> Result<Vec<PublishResult>, AppError> {
        if !self.verified {
            return Err(AppError::NotVerified);
        }
        self.orchestrator
            .publish_all(&self.credentials, articles, visibility, reporter)
            .await
    }
}
