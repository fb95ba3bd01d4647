pub mod config;
pub mod generator;
pub mod wordpress;

pub use config::{Endpoint, GeneratorConfig};
pub use generator::ChatCompletionGenerator;
pub use wordpress::WordPressPublisher;
