//! Sequential batch publishing with a fixed pacing delay.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::AppError;
use crate::models::Article;
use crate::publish::{PostPayload, PublishCredentials, PublishResult, Visibility};
use crate::traits::Publisher;

/// Configuration for the publish orchestrator.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Wait inserted between consecutive publish calls.
    pub pacing: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_secs(1),
        }
    }
}

impl PublishConfig {
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Events emitted by the publish orchestrator for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PublishEvent<'a> {
    BatchStarted {
        total: usize,
        visibility: Visibility,
    },
    ItemStarted {
        index: usize,
        title: &'a str,
    },
    ItemPublished {
        index: usize,
        title: &'a str,
        remote_url: &'a str,
    },
    ItemFailed {
        index: usize,
        title: &'a str,
        error: &'a str,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

/// Trait for receiving publish events (decoupled logging).
pub trait PublishReporter: Send + Sync {
    fn report(&self, event: PublishEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublishReporter;

impl PublishReporter for TracingPublishReporter {
    fn report(&self, event: PublishEvent<'_>) {
        match event {
            PublishEvent::BatchStarted { total, visibility } => {
                tracing::info!(%total, %visibility, "Publishing batch");
            }
            PublishEvent::ItemStarted { index, title } => {
                tracing::info!(%index, %title, "Publishing");
            }
            PublishEvent::ItemPublished {
                index,
                title,
                remote_url,
            } => {
                tracing::info!(%index, %title, %remote_url, "Published");
            }
            PublishEvent::ItemFailed {
                index,
                title,
                error,
            } => {
                tracing::warn!(%index, %title, %error, "Publish failed");
            }
            PublishEvent::BatchFinished { succeeded, failed } => {
                tracing::info!(%succeeded, %failed, "Publishing finished");
            }
        }
    }
}

/// Display state of one item in a publish batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishItemState {
    Pending,
    InFlight,
    Published,
    Failed,
}

/// Immutable view of publishing progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishSnapshot {
    pub publishing: bool,
    pub total: usize,
    /// Results so far, in submission order.
    pub results: Vec<PublishResult>,
    /// Index of the item whose publish call is running. `None` while pacing.
    pub in_flight: Option<usize>,
}

impl PublishSnapshot {
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    pub fn item_state(&self, index: usize) -> PublishItemState {
        match self.results.get(index) {
            Some(r) if r.is_success() => PublishItemState::Published,
            Some(_) => PublishItemState::Failed,
            None if self.in_flight == Some(index) => PublishItemState::InFlight,
            None => PublishItemState::Pending,
        }
    }
}

/// Releases the orchestrator when a batch ends, including when the
/// `publish_all` future is dropped part-way.
struct PublishClaim<'a> {
    state: &'a watch::Sender<PublishSnapshot>,
}

impl Drop for PublishClaim<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|snapshot| {
            let held = snapshot.publishing || snapshot.in_flight.is_some();
            snapshot.publishing = false;
            snapshot.in_flight = None;
            held
        });
    }
}

/// Publishes a batch of articles one at a time.
pub struct PublishOrchestrator<P: Publisher> {
    publisher: P,
    config: PublishConfig,
    state: watch::Sender<PublishSnapshot>,
}

impl<P: Publisher> PublishOrchestrator<P> {
    pub fn new(publisher: P, config: PublishConfig) -> Self {
        let (state, _) = watch::channel(PublishSnapshot::default());
        Self {
            publisher,
            config,
            state,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PublishSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_publishing(&self) -> bool {
        self.state.borrow().publishing
    }

    /// Publish every article, returning one result per article in order.
    ///
    /// A failure on one article never affects the next. Fails only if
    /// another batch is already publishing through this orchestrator.
    pub async fn publish_all<R: PublishReporter>(
        &self,
        credentials: &PublishCredentials,
        articles: &[Article],
        visibility: Visibility,
        reporter: &R,
    ) -> Result<Vec<PublishResult>, AppError> {
        let started = self.state.send_if_modified(|snapshot| {
            if snapshot.publishing {
                return false;
            }
            *snapshot = PublishSnapshot {
                publishing: !articles.is_empty(),
                total: articles.len(),
                results: Vec::new(),
                in_flight: None,
            };
            true
        });
        if !started {
            return Err(AppError::BatchInProgress);
        }
        let _claim = PublishClaim { state: &self.state };

        reporter.report(PublishEvent::BatchStarted {
            total: articles.len(),
            visibility,
        });

        let mut results = Vec::with_capacity(articles.len());
        for (index, article) in articles.iter().enumerate() {
            if index > 0 && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }

            self.state
                .send_modify(|snapshot| snapshot.in_flight = Some(index));
            reporter.report(PublishEvent::ItemStarted {
                index,
                title: &article.title,
            });

            let post = PostPayload::from_article(article, visibility);
            let result = self.publisher.publish(credentials, &post).await;

            match &result {
                PublishResult::Published { remote_url, .. } => {
                    reporter.report(PublishEvent::ItemPublished {
                        index,
                        title: &article.title,
                        remote_url,
                    });
                }
                PublishResult::Failed { error } => {
                    reporter.report(PublishEvent::ItemFailed {
                        index,
                        title: &article.title,
                        error,
                    });
                }
            }

            let last = index + 1 == articles.len();
            self.state.send_modify(|snapshot| {
                snapshot.results.push(result.clone());
                snapshot.in_flight = None;
                if last {
                    snapshot.publishing = false;
                }
            });
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        reporter.report(PublishEvent::BatchFinished {
            succeeded,
            failed: results.len() - succeeded,
        });

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testutil::*;

    fn creds() -> PublishCredentials {
        PublishCredentials::new("example.com", "admin", "app-pass").unwrap()
    }

    fn unpaced() -> PublishConfig {
        PublishConfig::default().with_pacing(Duration::ZERO)
    }

    #[tokio::test]
    async fn rejected_second_call_does_not_stop_third() {
        let publisher = MockPublisher::with_results(vec![
            MockPublisher::published(1),
            PublishResult::failed("Sorry, you are not allowed to create posts."),
            MockPublisher::published(3),
        ]);
        let orchestrator = PublishOrchestrator::new(publisher.clone(), unpaced());
        let batch = make_test_articles(3);

        let results = orchestrator
            .publish_all(&creds(), &batch, Visibility::Draft, &MockReporter::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert_eq!(
            results[1].error(),
            Some("Sorry, you are not allowed to create posts.")
        );
        assert!(results[2].is_success());

        let posts = publisher.published_posts.lock().unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Blog on Topic 1", "Blog on Topic 2", "Blog on Topic 3"]
        );
        assert!(posts.iter().all(|p| p.status == Visibility::Draft));
    }

    #[tokio::test]
    async fn all_failures_still_yield_one_result_each() {
        let publisher = MockPublisher::always_failing("HTTP 500: Internal Server Error");
        let orchestrator = PublishOrchestrator::new(publisher, unpaced());

        let results = orchestrator
            .publish_all(&creds(), &make_test_articles(4), Visibility::Live, &MockReporter::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.is_success()));
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.failure_count(), 4);
        assert!(!snapshot.publishing);
    }

    #[tokio::test]
    async fn credentials_are_passed_to_every_call() {
        let publisher = MockPublisher::succeeding();
        let orchestrator = PublishOrchestrator::new(publisher.clone(), unpaced());

        orchestrator
            .publish_all(&creds(), &make_test_articles(2), Visibility::Live, &MockReporter::new())
            .await
            .unwrap();

        let sites = publisher.publish_sites.lock().unwrap();
        assert_eq!(*sites, vec!["https://example.com", "https://example.com"]);
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_results() {
        let publisher = MockPublisher::succeeding();
        let orchestrator = PublishOrchestrator::new(publisher.clone(), PublishConfig::default());

        let results = orchestrator
            .publish_all(&creds(), &[], Visibility::Draft, &MockReporter::new())
            .await
            .unwrap();

        assert!(results.is_empty());
        assert!(!orchestrator.is_publishing());
        assert!(publisher.published_posts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_is_inserted_between_calls_only() {
        let orchestrator = PublishOrchestrator::new(
            MockPublisher::succeeding(),
            PublishConfig::default().with_pacing(Duration::from_secs(1)),
        );

        let start = tokio::time::Instant::now();
        orchestrator
            .publish_all(&creds(), &make_test_articles(3), Visibility::Draft, &MockReporter::new())
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(2), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "elapsed: {elapsed:?}");
    }

    #[tokio::test]
    async fn reporter_events_follow_item_order() {
        let reporter = MockReporter::new();
        let publisher = MockPublisher::with_results(vec![
            PublishResult::failed("nope"),
            MockPublisher::published(2),
        ]);
        let orchestrator = PublishOrchestrator::new(publisher, unpaced());

        orchestrator
            .publish_all(&creds(), &make_test_articles(2), Visibility::Draft, &reporter)
            .await
            .unwrap();

        assert_eq!(
            *reporter.events.lock().unwrap(),
            vec![
                "PublishStarted",
                "ItemStarted",
                "ItemFailed",
                "ItemStarted",
                "ItemPublished",
                "PublishFinished"
            ]
        );
    }

    #[test]
    fn item_states_follow_results_and_in_flight_index() {
        let snapshot = PublishSnapshot {
            publishing: true,
            total: 4,
            results: vec![MockPublisher::published(1), PublishResult::failed("x")],
            in_flight: Some(2),
        };
        assert_eq!(snapshot.item_state(0), PublishItemState::Published);
        assert_eq!(snapshot.item_state(1), PublishItemState::Failed);
        assert_eq!(snapshot.item_state(2), PublishItemState::InFlight);
        assert_eq!(snapshot.item_state(3), PublishItemState::Pending);
        assert_eq!(snapshot.completed(), 2);
        assert_eq!(snapshot.success_count(), 1);

        let pacing = PublishSnapshot {
            in_flight: None,
            ..snapshot
        };
        assert_eq!(pacing.item_state(2), PublishItemState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn next_item_stays_pending_during_pacing() {
        let orchestrator = Arc::new(PublishOrchestrator::new(
            MockPublisher::succeeding(),
            PublishConfig::default().with_pacing(Duration::from_secs(1)),
        ));

        let running = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .publish_all(
                        &creds(),
                        &make_test_articles(2),
                        Visibility::Draft,
                        &TracingPublishReporter,
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.publishing);
        assert_eq!(snapshot.results.len(), 1);
        assert_eq!(snapshot.in_flight, None);
        assert_eq!(snapshot.item_state(1), PublishItemState::Pending);

        let results = running.await.unwrap().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(orchestrator.snapshot().in_flight, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_batch_releases_orchestrator() {
        let publisher = MockPublisher::succeeding();
        let orchestrator = PublishOrchestrator::new(
            publisher.clone(),
            PublishConfig::default().with_pacing(Duration::from_secs(1)),
        );

        let timed_out = tokio::time::timeout(
            Duration::from_millis(1500),
            orchestrator.publish_all(
                &creds(),
                &make_test_articles(3),
                Visibility::Draft,
                &MockReporter::new(),
            ),
        )
        .await;
        assert!(timed_out.is_err());

        let snapshot = orchestrator.snapshot();
        assert!(!snapshot.publishing);
        assert_eq!(snapshot.in_flight, None);
        assert_eq!(snapshot.results.len(), 2);
        assert_eq!(snapshot.item_state(2), PublishItemState::Pending);

        let results = orchestrator
            .publish_all(&creds(), &make_test_articles(1), Visibility::Draft, &MockReporter::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(publisher.published_posts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn snapshot_grows_one_result_per_item() {
        let orchestrator = PublishOrchestrator::new(MockPublisher::succeeding(), unpaced());
        let mut rx = orchestrator.subscribe();

        let observer = tokio::spawn(async move {
            let mut lengths = Vec::new();
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                lengths.push(snapshot.results.len());
                if !snapshot.publishing && snapshot.results.len() == snapshot.total {
                    break;
                }
            }
            lengths
        });

        orchestrator
            .publish_all(&creds(), &make_test_articles(3), Visibility::Draft, &MockReporter::new())
            .await
            .unwrap();

        let lengths = observer.await.unwrap();
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lengths.last(), Some(&3));
    }
}
