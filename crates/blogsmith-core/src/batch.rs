//! Batch submission policy: what the caller-facing boundary does to raw
//! input before the generation orchestrator ever sees it.

use serde::{Deserialize, Serialize};

/// Batches larger than this still run, but get a warning.
pub const RECOMMENDED_MAX_JOBS: usize = 20;

/// Upper bound on articles per topic.
pub const MAX_REPEAT: u32 = 50;

/// Number of articles to generate per topic, between 1 and [`MAX_REPEAT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct RepeatCount(u32);

impl RepeatCount {
    /// Clamp any integer to a valid repeat count.
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(1, i64::from(MAX_REPEAT));
        if clamped != value {
            tracing::warn!(requested = value, used = clamped, "Repeat count out of range");
        }
        Self(clamped as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        Self(1)
    }
}

impl From<i64> for RepeatCount {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<RepeatCount> for u32 {
    fn from(value: RepeatCount) -> Self {
        value.0
    }
}

/// A normalized generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub topics: Vec<String>,
    pub repeat: RepeatCount,
    pub instruction: Option<String>,
}

impl BatchRequest {
    /// Normalize raw form input.
    ///
    /// Topics are trimmed and blank entries dropped; order and duplicates are
    /// kept. A blank instruction becomes `None`.
    pub fn new<I, S>(topics: I, repeat: RepeatCount, instruction: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let instruction = instruction
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let request = Self {
            topics,
            repeat,
            instruction,
        };

        if request.total_jobs() > RECOMMENDED_MAX_JOBS {
            tracing::warn!(
                total_jobs = request.total_jobs(),
                recommended = RECOMMENDED_MAX_JOBS,
                "Batch is larger than recommended for one session"
            );
        }

        request
    }

    pub fn total_jobs(&self) -> usize {
        self.topics.len() * self.repeat.get() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
