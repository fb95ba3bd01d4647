//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::generation::{GenerationEvent, GenerationReporter};
use crate::models::Article;
use crate::publish::{PostPayload, PublishCredentials, PublishResult};
use crate::publishing::{PublishEvent, PublishReporter};
use crate::traits::{ContentGenerator, Publisher};

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

/// Arguments of one recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub topic: String,
    pub repetition_index: Option<u32>,
    pub instruction: Option<String>,
}

/// Mock generator that returns queued bodies or errors.
#[derive(Clone, Default)]
pub struct MockGenerator {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default body.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub calls: Arc<Mutex<Vec<GenerateCall>>>,
}

impl MockGenerator {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ContentGenerator for MockGenerator {
    async fn generate(
        &self,
        topic: &str,
        repetition_index: Option<u32>,
        instruction: Option<&str>,
    ) -> Result<Article, AppError> {
        self.calls.lock().unwrap().push(GenerateCall {
            topic: topic.to_string(),
            repetition_index,
            instruction: instruction.map(str::to_string),
        });

        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(format!("<p>Generated post about {topic}.</p>"))
            } else {
                responses.remove(0)
            }
        };
        next.map(|body| Article::new(topic, format!("Blog on {topic}"), body))
    }
}

// ---------------------------------------------------------------------------
// MockPublisher
// ---------------------------------------------------------------------------

/// Mock publisher with configurable probe outcomes and publish results.
#[derive(Clone, Default)]
pub struct MockPublisher {
    probe_results: Arc<Mutex<Vec<Result<(), AppError>>>>,
    publish_results: Arc<Mutex<Vec<PublishResult>>>,
    fail_all: Option<String>,
    pub probe_sites: Arc<Mutex<Vec<String>>>,
    pub publish_sites: Arc<Mutex<Vec<String>>>,
    pub published_posts: Arc<Mutex<Vec<PostPayload>>>,
}

impl MockPublisher {
    /// Every probe and publish call succeeds.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Publish calls pop from `results`; once drained they succeed.
    pub fn with_results(results: Vec<PublishResult>) -> Self {
        Self {
            publish_results: Arc::new(Mutex::new(results)),
            ..Self::default()
        }
    }

    /// Every publish call fails with `error`.
    pub fn always_failing(error: &str) -> Self {
        Self {
            fail_all: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Probe calls pop from `results`; once drained they succeed.
    pub fn with_probe_results(mut self, results: Vec<Result<(), AppError>>) -> Self {
        self.probe_results = Arc::new(Mutex::new(results));
        self
    }

    pub fn published(remote_id: u64) -> PublishResult {
        PublishResult::Published {
            remote_id,
            remote_url: format!("https://example.com/?p={remote_id}"),
        }
    }
}

impl Publisher for MockPublisher {
    async fn probe(&self, credentials: &PublishCredentials) -> Result<(), AppError> {
        self.probe_sites
            .lock()
            .unwrap()
            .push(credentials.site_url().to_string());

        let mut results = self.probe_results.lock().unwrap();
        if results.is_empty() {
            Ok(())
        } else {
            results.remove(0)
        }
    }

    async fn publish(&self, credentials: &PublishCredentials, post: &PostPayload) -> PublishResult {
        self.publish_sites
            .lock()
            .unwrap()
            .push(credentials.site_url().to_string());
        let n = {
            let mut posts = self.published_posts.lock().unwrap();
            posts.push(post.clone());
            posts.len() as u64
        };

        if let Some(error) = &self.fail_all {
            return PublishResult::failed(error.clone());
        }
        let mut results = self.publish_results.lock().unwrap();
        if results.is_empty() {
            Self::published(n)
        } else {
            results.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock reporter that records event labels from either orchestrator.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, label: &str) {
        self.events.lock().unwrap().push(label.to_string());
    }
}

impl GenerationReporter for MockReporter {
    fn report(&self, event: GenerationEvent<'_>) {
        self.push(match event {
            GenerationEvent::BatchStarted { .. } => "BatchStarted",
            GenerationEvent::JobStarted { .. } => "JobStarted",
            GenerationEvent::JobCompleted { .. } => "JobCompleted",
            GenerationEvent::JobFailed { .. } => "JobFailed",
            GenerationEvent::BatchFinished { .. } => "BatchFinished",
        });
    }
}

impl PublishReporter for MockReporter {
    fn report(&self, event: PublishEvent<'_>) {
        self.push(match event {
            PublishEvent::BatchStarted { .. } => "PublishStarted",
            PublishEvent::ItemStarted { .. } => "ItemStarted",
            PublishEvent::ItemPublished { .. } => "ItemPublished",
            PublishEvent::ItemFailed { .. } => "ItemFailed",
            PublishEvent::BatchFinished { .. } => "PublishFinished",
        });
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create `n` completed articles titled "Blog on Topic {i}".
pub fn make_test_articles(n: usize) -> Vec<Article> {
    (1..=n)
        .map(|i| {
            Article::new(
                format!("Topic {i}"),
                format!("Blog on Topic {i}"),
                format!("<p>Body of post {i}.</p>"),
            )
        })
        .collect()
}
