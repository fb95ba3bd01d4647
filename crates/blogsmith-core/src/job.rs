use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::RepeatCount;
use crate::error::AppError;

/// Status of a generation job within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Generating,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Generating => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// The only legal edges are `pending -> generating` and
    /// `generating -> completed | error`.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, AppError> {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Generating)
            | (JobStatus::Generating, JobStatus::Completed)
            | (JobStatus::Generating, JobStatus::Error) => Ok(next),
            (from, to) => Err(AppError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "generating" => Ok(JobStatus::Generating),
            "completed" => Ok(JobStatus::Completed),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

/// One unit of content generation, tied to one occurrence of a topic.
///
/// Deserialization rejects jobs whose outcome fields contradict their status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JobRecord")]
pub struct GenerationJob {
    pub id: Uuid,
    /// Label shown to the user; disambiguated when a topic repeats.
    pub display_title: String,
    /// The topic exactly as submitted. This is what the generator receives.
    pub source_topic: String,
    /// 1-based position within the topic's repetition group.
    pub repetition_index: u32,
    status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    article_id: Option<Uuid>,
}

/// Wire shape of a [`GenerationJob`], checked before it becomes one.
#[derive(Deserialize)]
struct JobRecord {
    id: Uuid,
    display_title: String,
    source_topic: String,
    repetition_index: u32,
    status: JobStatus,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    article_id: Option<Uuid>,
}

impl TryFrom<JobRecord> for GenerationJob {
    type Error = String;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        if record.repetition_index == 0 {
            return Err(format!("job {}: repetition_index starts at 1", record.id));
        }
        let consistent = match record.status {
            JobStatus::Pending | JobStatus::Generating => {
                record.error.is_none() && record.article_id.is_none()
            }
            JobStatus::Completed => record.error.is_none() && record.article_id.is_some(),
            JobStatus::Error => record.error.is_some() && record.article_id.is_none(),
        };
        if !consistent {
            return Err(format!(
                "job {}: status '{}' does not match its error/article fields",
                record.id, record.status
            ));
        }

        Ok(Self {
            id: record.id,
            display_title: record.display_title,
            source_topic: record.source_topic,
            repetition_index: record.repetition_index,
            status: record.status,
            error: record.error,
            article_id: record.article_id,
        })
    }
}

impl GenerationJob {
    pub fn new(source_topic: impl Into<String>, repetition_index: u32, repeat: RepeatCount) -> Self {
        let source_topic = source_topic.into();
        let display_title = if repeat.get() > 1 {
            format!("{} (Blog {})", source_topic, repetition_index)
        } else {
            source_topic.clone()
        };

        Self {
            id: Uuid::new_v4(),
            display_title,
            source_topic,
            repetition_index,
            status: JobStatus::Pending,
            error: None,
            article_id: None,
        }
    }

    /// Expand topics into jobs, topic-major and repetition-minor.
    pub fn expand(topics: &[String], repeat: RepeatCount) -> Vec<GenerationJob> {
        topics
            .iter()
            .flat_map(|topic| (1..=repeat.get()).map(move |i| GenerationJob::new(topic, i, repeat)))
            .collect()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Failure reason, present only for jobs in `error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Id of the produced article, present only for jobs in `completed`.
    pub fn article_id(&self) -> Option<Uuid> {
        self.article_id
    }

    pub(crate) fn start(&mut self) -> Result<(), AppError> {
        self.status = self.status.transition(JobStatus::Generating)?;
        Ok(())
    }

    pub(crate) fn complete(&mut self, article_id: Uuid) -> Result<(), AppError> {
        self.status = self.status.transition(JobStatus::Completed)?;
        self.article_id = Some(article_id);
        Ok(())
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> Result<(), AppError> {
        self.status = self.status.transition(JobStatus::Error)?;
        self.error = Some(reason.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_job_status_roundtrip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Generating,
            JobStatus::Completed,
            JobStatus::Error,
        ] {
            let parsed: JobStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("running".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Generating.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            JobStatus::Pending.transition(JobStatus::Generating).unwrap(),
            JobStatus::Generating
        );
        assert_eq!(
            JobStatus::Generating.transition(JobStatus::Completed).unwrap(),
            JobStatus::Completed
        );
        assert_eq!(
            JobStatus::Generating.transition(JobStatus::Error).unwrap(),
            JobStatus::Error
        );
    }

    #[test]
    fn test_illegal_transitions() {
        let illegal = [
            (JobStatus::Pending, JobStatus::Completed),
            (JobStatus::Pending, JobStatus::Error),
            (JobStatus::Pending, JobStatus::Pending),
            (JobStatus::Generating, JobStatus::Pending),
            (JobStatus::Generating, JobStatus::Generating),
            (JobStatus::Completed, JobStatus::Generating),
            (JobStatus::Completed, JobStatus::Error),
            (JobStatus::Error, JobStatus::Completed),
            (JobStatus::Error, JobStatus::Pending),
        ];
        for (from, to) in illegal {
            let err = from.transition(to).unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition { .. }), "{from} -> {to}");
        }
    }

    #[test]
    fn test_expand_is_topic_major() {
        let jobs = GenerationJob::expand(&topics(&["A", "B"]), RepeatCount::new(2));
        let labels: Vec<_> = jobs
            .iter()
            .map(|j| (j.source_topic.as_str(), j.repetition_index))
            .collect();
        assert_eq!(labels, vec![("A", 1), ("A", 2), ("B", 1), ("B", 2)]);
        assert!(jobs.iter().all(|j| j.status() == JobStatus::Pending));
    }

    #[test]
    fn test_expand_count_matches_product() {
        for repeat in 1..=4 {
            let jobs = GenerationJob::expand(&topics(&["x", "y", "z"]), RepeatCount::new(repeat));
            assert_eq!(jobs.len(), 3 * repeat as usize);
        }
    }

    #[test]
    fn test_display_title_single_repeat_is_bare_topic() {
        let jobs = GenerationJob::expand(&topics(&["Rust"]), RepeatCount::new(1));
        assert_eq!(jobs[0].display_title, "Rust");
        assert_eq!(jobs[0].source_topic, "Rust");
    }

    #[test]
    fn test_display_title_disambiguates_repeats() {
        let jobs = GenerationJob::expand(&topics(&["Rust"]), RepeatCount::new(3));
        assert_eq!(jobs[1].display_title, "Rust (Blog 2)");
        assert!(jobs.iter().all(|j| j.source_topic == "Rust"));
    }

    #[test]
    fn test_duplicate_topics_get_distinct_jobs() {
        let jobs = GenerationJob::expand(&topics(&["A", "A"]), RepeatCount::new(1));
        assert_eq!(jobs.len(), 2);
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[test]
    fn test_job_lifecycle_records_outcome() {
        let mut ok = GenerationJob::new("A", 1, RepeatCount::new(1));
        let article_id = Uuid::new_v4();
        ok.start().unwrap();
        ok.complete(article_id).unwrap();
        assert_eq!(ok.status(), JobStatus::Completed);
        assert_eq!(ok.article_id(), Some(article_id));
        assert!(ok.error().is_none());

        let mut bad = GenerationJob::new("B", 1, RepeatCount::new(1));
        bad.start().unwrap();
        bad.fail("boom").unwrap();
        assert_eq!(bad.status(), JobStatus::Error);
        assert_eq!(bad.error(), Some("boom"));
        assert!(bad.fail("again").is_err());
    }

    #[test]
    fn test_deserialize_accepts_consistent_jobs() {
        let mut job = GenerationJob::new("A", 1, RepeatCount::new(1));
        job.start().unwrap();
        job.complete(Uuid::new_v4()).unwrap();

        let json = serde_json::to_string(&job).unwrap();
        let loaded: GenerationJob = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, job);
    }

    #[test]
    fn test_deserialize_rejects_contradictory_outcome() {
        let id = Uuid::new_v4();
        let completed_with_error = serde_json::json!({
            "id": id,
            "display_title": "A",
            "source_topic": "A",
            "repetition_index": 1,
            "status": "completed",
            "error": "boom",
            "article_id": Uuid::new_v4(),
        });
        let err = serde_json::from_value::<GenerationJob>(completed_with_error).unwrap_err();
        assert!(err.to_string().contains("does not match"));

        let error_without_reason = serde_json::json!({
            "id": id,
            "display_title": "A",
            "source_topic": "A",
            "repetition_index": 1,
            "status": "error",
        });
        assert!(serde_json::from_value::<GenerationJob>(error_without_reason).is_err());

        let pending_with_article = serde_json::json!({
            "id": id,
            "display_title": "A",
            "source_topic": "A",
            "repetition_index": 1,
            "status": "pending",
            "article_id": Uuid::new_v4(),
        });
        assert!(serde_json::from_value::<GenerationJob>(pending_with_article).is_err());
    }

    #[test]
    fn test_job_cannot_skip_generating() {
        let mut job = GenerationJob::new("A", 1, RepeatCount::new(1));
        assert!(job.complete(Uuid::new_v4()).is_err());
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.article_id().is_none());
    }
}
