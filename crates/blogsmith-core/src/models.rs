use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum summary length in characters, before the ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

/// A completed piece of generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    /// The source topic this article was generated from.
    pub topic: String,
    pub title: String,
    pub body: String,
    pub summary: String,
    pub word_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl Article {
    /// Build an article from generated text, deriving summary and word count.
    pub fn new(topic: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            title: title.into(),
            summary: summarize(&body),
            word_count: count_words(&body),
            body,
            generated_at: Utc::now(),
        }
    }

    /// Apply a user edit. `word_count` always follows the resulting body.
    pub fn apply_edit(&mut self, edit: ArticleEdit) {
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(summary) = edit.summary {
            self.summary = summary;
        }
        if let Some(body) = edit.body {
            self.body = body;
        }
        self.word_count = count_words(&self.body);
    }
}

/// Fields a user may change on a generated article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub summary: Option<String>,
}

impl ArticleEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.summary.is_none()
    }
}

/// Number of whitespace-delimited tokens.
pub fn count_words(body: &str) -> usize {
    body.split_whitespace().count()
}

/// Short excerpt of a body.
///
/// Bodies of at most [`SUMMARY_MAX_CHARS`] characters are returned trimmed.
/// Longer bodies are cut on a character boundary, pulled back to the last
/// whitespace in the window if the cut would land inside a word, and get a
/// trailing `...`.
pub fn summarize(body: &str) -> String {
    let body = body.trim();
    let cut = match body.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((idx, _)) => idx,
        None => return body.to_string(),
    };

    let mut window = &body[..cut];
    let splits_word = !body[cut..].starts_with(char::is_whitespace)
        && !window.ends_with(char::is_whitespace);
    if splits_word && let Some(ws) = window.rfind(char::is_whitespace) {
        window = &window[..ws];
    }

    format!("{}{}", window.trim_end(), ELLIPSIS)
}
