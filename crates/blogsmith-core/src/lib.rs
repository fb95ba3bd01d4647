pub mod batch;
pub mod error;
pub mod generation;
pub mod job;
pub mod models;
pub mod publish;
pub mod publishing;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use batch::{BatchRequest, MAX_REPEAT, RECOMMENDED_MAX_JOBS, RepeatCount};
pub use error::AppError;
pub use generation::{
    GenerationBatch, GenerationOrchestrator, GenerationReporter, GenerationSnapshot,
    TracingGenerationReporter,
};
pub use job::{GenerationJob, JobStatus};
pub use models::{Article, ArticleEdit};
pub use publish::{PostPayload, PublishCredentials, PublishResult, Visibility};
pub use publishing::{
    PublishConfig, PublishItemState, PublishOrchestrator, PublishReporter, PublishSnapshot,
    TracingPublishReporter,
};
pub use session::PublishSession;
pub use traits::{ContentGenerator, Publisher};
