//! Sequential batch generation.
//!
//! Expands a [`BatchRequest`] into jobs and drives them through a
//! [`ContentGenerator`] one at a time. After every status change a fresh
//! [`GenerationSnapshot`] is published on a `watch` channel, so callers can
//! render progress without touching orchestrator internals.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::batch::BatchRequest;
use crate::error::AppError;
use crate::job::{GenerationJob, JobStatus};
use crate::models::Article;
use crate::traits::ContentGenerator;

/// Failure reason recorded on a job whose batch was dropped mid-call.
pub const INTERRUPTED_REASON: &str = "Generation was interrupted before it finished";

/// Events emitted by the generation orchestrator for monitoring/logging.
#[derive(Debug, Clone)]
pub enum GenerationEvent<'a> {
    BatchStarted {
        total_jobs: usize,
    },
    JobStarted {
        index: usize,
        job: &'a GenerationJob,
    },
    JobCompleted {
        index: usize,
        job: &'a GenerationJob,
        article: &'a Article,
    },
    JobFailed {
        index: usize,
        job: &'a GenerationJob,
        error: &'a str,
    },
    BatchFinished {
        completed: usize,
        failed: usize,
    },
}

/// Trait for receiving generation events (decoupled logging).
pub trait GenerationReporter: Send + Sync {
    fn report(&self, event: GenerationEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingGenerationReporter;

impl GenerationReporter for TracingGenerationReporter {
    fn report(&self, event: GenerationEvent<'_>) {
        match event {
            GenerationEvent::BatchStarted { total_jobs } => {
                tracing::info!(%total_jobs, "Generation batch started");
            }
            GenerationEvent::JobStarted { index, job } => {
                tracing::info!(
                    %index,
                    job_id = %job.id,
                    title = %job.display_title,
                    "Generating"
                );
            }
            GenerationEvent::JobCompleted {
                index,
                job,
                article,
            } => {
                tracing::info!(
                    %index,
                    job_id = %job.id,
                    article_id = %article.id,
                    word_count = article.word_count,
                    "Job completed"
                );
            }
            GenerationEvent::JobFailed { index, job, error } => {
                tracing::warn!(%index, job_id = %job.id, %error, "Job failed");
            }
            GenerationEvent::BatchFinished { completed, failed } => {
                tracing::info!(%completed, %failed, "Generation batch finished");
            }
        }
    }
}

/// Jobs and the articles produced by the ones that completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub jobs: Vec<GenerationJob>,
    pub articles: Vec<Article>,
}

impl GenerationBatch {
    pub fn completed_count(&self) -> usize {
        self.count(JobStatus::Completed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(JobStatus::Error)
    }

    /// Jobs that reached a terminal state.
    pub fn resolved_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.status().is_terminal()).count()
    }

    pub fn article_mut(&mut self, id: Uuid) -> Option<&mut Article> {
        self.articles.iter_mut().find(|a| a.id == id)
    }

    fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status() == status).count()
    }
}

/// Immutable view of the orchestrator's state after a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSnapshot {
    /// True from the moment a batch starts until its last job resolves.
    pub generating: bool,
    pub batch: GenerationBatch,
}

impl GenerationSnapshot {
    /// The job currently being generated, if any.
    pub fn in_flight(&self) -> Option<&GenerationJob> {
        self.batch
            .jobs
            .iter()
            .find(|j| j.status() == JobStatus::Generating)
    }
}

/// Releases the orchestrator when a batch ends, including when the `run`
/// future is dropped part-way. A job left in `generating` is failed.
struct GenerationClaim<'a> {
    state: &'a watch::Sender<GenerationSnapshot>,
}

impl Drop for GenerationClaim<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|snapshot| {
            for job in &mut snapshot.batch.jobs {
                if job.status() == JobStatus::Generating {
                    let _ = job.fail(INTERRUPTED_REASON);
                }
            }
            snapshot.generating = false;
        });
    }
}

/// Drives generation jobs through a [`ContentGenerator`] strictly in order.
pub struct GenerationOrchestrator<G: ContentGenerator> {
    generator: G,
    state: watch::Sender<GenerationSnapshot>,
}

impl<G: ContentGenerator> GenerationOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        let (state, _) = watch::channel(GenerationSnapshot::default());
        Self { generator, state }
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<GenerationSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_generating(&self) -> bool {
        self.state.borrow().generating
    }

    /// Run a batch to completion.
    ///
    /// Individual job failures are recorded on the job and never stop the
    /// batch. An empty request is a no-op. Fails only if another batch is
    /// already running on this orchestrator.
    pub async fn run<R: GenerationReporter>(
        &self,
        request: &BatchRequest,
        reporter: &R,
    ) -> Result<GenerationBatch, AppError> {
        if request.is_empty() {
            return Ok(GenerationBatch::default());
        }

        let jobs = GenerationJob::expand(&request.topics, request.repeat);

        // Claim the orchestrator and discard the previous batch in one step.
        let started = self.state.send_if_modified(|snapshot| {
            if snapshot.generating {
                return false;
            }
            *snapshot = GenerationSnapshot {
                generating: true,
                batch: GenerationBatch {
                    jobs: jobs.clone(),
                    articles: Vec::new(),
                },
            };
            true
        });
        if !started {
            return Err(AppError::BatchInProgress);
        }
        let claim = GenerationClaim { state: &self.state };

        reporter.report(GenerationEvent::BatchStarted {
            total_jobs: jobs.len(),
        });

        let result = self.drive(jobs, request.instruction.as_deref(), reporter).await;
        drop(claim);

        let batch = result?;
        reporter.report(GenerationEvent::BatchFinished {
            completed: batch.completed_count(),
            failed: batch.failed_count(),
        });
        Ok(batch)
    }

    async fn drive<R: GenerationReporter>(
        &self,
        mut jobs: Vec<GenerationJob>,
        instruction: Option<&str>,
        reporter: &R,
    ) -> Result<GenerationBatch, AppError> {
        let mut articles = Vec::new();

        for index in 0..jobs.len() {
            jobs[index].start()?;
            self.publish(&jobs, &articles);
            reporter.report(GenerationEvent::JobStarted {
                index,
                job: &jobs[index],
            });

            let outcome = {
                let job = &jobs[index];
                self.generator
                    .generate(&job.source_topic, Some(job.repetition_index), instruction)
                    .await
            };

            match outcome {
                Ok(article) => {
                    jobs[index].complete(article.id)?;
                    reporter.report(GenerationEvent::JobCompleted {
                        index,
                        job: &jobs[index],
                        article: &article,
                    });
                    articles.push(article);
                }
                Err(e) => {
                    let error = e.to_string();
                    jobs[index].fail(error.as_str())?;
                    reporter.report(GenerationEvent::JobFailed {
                        index,
                        job: &jobs[index],
                        error: &error,
                    });
                }
            }

            self.publish(&jobs, &articles);
        }

        Ok(GenerationBatch { jobs, articles })
    }

    fn publish(&self, jobs: &[GenerationJob], articles: &[Article]) {
        self.state.send_modify(|snapshot| {
            snapshot.batch.jobs = jobs.to_vec();
            snapshot.batch.articles = articles.to_vec();
        });
    }
}
