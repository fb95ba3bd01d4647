use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use blogsmith_client::{ChatCompletionGenerator, GeneratorConfig, WordPressPublisher};
use blogsmith_core::{
    ArticleEdit, BatchRequest, GenerationBatch, GenerationOrchestrator, PublishConfig,
    PublishCredentials, PublishResult, PublishSession, RepeatCount, TracingGenerationReporter,
    TracingPublishReporter, Visibility,
};

#[derive(Parser)]
#[command(name = "blogsmith", version, about = "Batch blog generation and WordPress publishing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one or more articles per topic
    Generate {
        /// Topic to write about (repeatable)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// File with one topic per line
        #[arg(long)]
        topics_file: Option<PathBuf>,

        /// Articles per topic (clamped to 1..=50)
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        count: i64,

        /// Extra instruction appended to every prompt
        #[arg(short, long)]
        instruction: Option<String>,

        /// Write the batch JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Edit one generated article in a batch file
    Edit {
        /// Batch file written by `generate`
        #[arg(short, long)]
        batch: PathBuf,

        /// Article id
        #[arg(short, long)]
        article: Uuid,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        summary: Option<String>,

        /// Replace the body with this file's contents
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// Check WordPress credentials
    Probe {
        #[command(flatten)]
        wordpress: WordPressArgs,
    },

    /// Publish every article in a batch file
    Publish {
        /// Batch file written by `generate`
        #[arg(short, long)]
        batch: PathBuf,

        /// "draft" or "publish"
        #[arg(long, default_value = "draft")]
        visibility: Visibility,

        /// Delay between consecutive posts
        #[arg(long, default_value_t = 1000)]
        pacing_ms: u64,

        #[command(flatten)]
        wordpress: WordPressArgs,
    },
}

#[derive(Args)]
struct GeneratorArgs {
    /// Chat-completions base URL (Azure resource endpoint or OpenAI-compatible API)
    #[arg(long, env = "BLOGSMITH_BASE_URL")]
    base_url: String,

    /// Azure deployment name, or model name for OpenAI-compatible APIs
    #[arg(long, env = "BLOGSMITH_DEPLOYMENT")]
    deployment: String,

    #[arg(long, env = "BLOGSMITH_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Azure API version; selects the Azure endpoint layout when set
    #[arg(long, env = "BLOGSMITH_API_VERSION")]
    api_version: Option<String>,

    /// Sampling temperature between 0 and 2 [default: 0.7]
    #[arg(long, env = "BLOGSMITH_TEMPERATURE")]
    temperature: Option<String>,

    /// Completion token limit [default: 1500]
    #[arg(long, env = "BLOGSMITH_MAX_TOKENS")]
    max_tokens: Option<String>,
}

impl GeneratorArgs {
    fn into_config(self) -> Result<GeneratorConfig> {
        GeneratorConfig::from_lookup(|key| match key {
            "BLOGSMITH_BASE_URL" => Some(self.base_url.clone()),
            "BLOGSMITH_DEPLOYMENT" => Some(self.deployment.clone()),
            "BLOGSMITH_API_KEY" => Some(self.api_key.clone()),
            "BLOGSMITH_API_VERSION" => self.api_version.clone(),
            "BLOGSMITH_TEMPERATURE" => self.temperature.clone(),
            "BLOGSMITH_MAX_TOKENS" => self.max_tokens.clone(),
            _ => None,
        })
        .map_err(|e| anyhow::anyhow!(e))
    }
}

#[derive(Args)]
struct WordPressArgs {
    /// WordPress site URL (https:// is assumed when no scheme is given)
    #[arg(long, env = "WORDPRESS_SITE_URL")]
    site: String,

    #[arg(long, env = "WORDPRESS_USERNAME")]
    username: String,

    /// Application password
    #[arg(long, env = "WORDPRESS_APP_PASSWORD", hide_env_values = true)]
    password: String,
}

impl WordPressArgs {
    fn credentials(&self) -> Result<PublishCredentials> {
        PublishCredentials::new(&self.site, &self.username, &self.password)
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("blogsmith=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            topics,
            topics_file,
            count,
            instruction,
            out,
            generator,
        } => {
            let mut topics = topics;
            if let Some(path) = &topics_file {
                topics.extend(read_topics(path)?);
            }
            let request = BatchRequest::new(topics, RepeatCount::new(count), instruction.as_deref());
            cmd_generate(&request, generator.into_config()?, out.as_deref()).await?;
        }
        Commands::Edit {
            batch,
            article,
            title,
            summary,
            body_file,
        } => {
            let body = match &body_file {
                Some(path) => Some(
                    std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read body file: {}", path.display()))?,
                ),
                None => None,
            };
            let edit = ArticleEdit {
                title,
                body,
                summary,
            };
            cmd_edit(&batch, article, edit)?;
        }
        Commands::Probe { wordpress } => {
            let credentials = wordpress.credentials()?;
            let publisher = WordPressPublisher::new().context("Failed to create HTTP client")?;
            let mut session = PublishSession::new(publisher, credentials, PublishConfig::default());
            session
                .probe()
                .await
                .map_err(|e| anyhow::anyhow!(e))
                .context("Connection check failed")?;
            println!("Connected to {}", session.credentials().site_url());
        }
        Commands::Publish {
            batch,
            visibility,
            pacing_ms,
            wordpress,
        } => {
            let config = PublishConfig::default().with_pacing(Duration::from_millis(pacing_ms));
            cmd_publish(&batch, visibility, config, wordpress.credentials()?).await?;
        }
    }

    Ok(())
}

/// Read one topic per line. Blank lines are dropped later by `BatchRequest`.
fn read_topics(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topics file: {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn read_batch(path: &Path) -> Result<GenerationBatch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid batch file: {}", path.display()))
}

fn write_batch(path: &Path, batch: &GenerationBatch) -> Result<()> {
    let json = serde_json::to_string_pretty(batch)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write batch file: {}", path.display()))
}

async fn cmd_generate(
    request: &BatchRequest,
    config: GeneratorConfig,
    out: Option<&Path>,
) -> Result<()> {
    if request.is_empty() {
        bail!("No topics given. Use --topic or --topics-file.");
    }

    let generator = ChatCompletionGenerator::new(config).map_err(|e| anyhow::anyhow!(e))?;
    let orchestrator = GenerationOrchestrator::new(generator);

    let batch = orchestrator
        .run(request, &TracingGenerationReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match out {
        Some(path) => {
            write_batch(path, &batch)?;
            tracing::info!(path = %path.display(), "Batch written");
        }
        None => println!("{}", serde_json::to_string_pretty(&batch)?),
    }

    eprintln!(
        "Generated {} of {} articles ({} failed)",
        batch.completed_count(),
        batch.jobs.len(),
        batch.failed_count()
    );
    for job in batch.jobs.iter().filter(|j| j.error().is_some()) {
        eprintln!("  {}: {}", job.display_title, job.error().unwrap_or_default());
    }

    Ok(())
}

/// Apply `edit` to the article with `id`.
fn edit_article(batch: &mut GenerationBatch, id: Uuid, edit: ArticleEdit) -> Result<()> {
    if edit.is_empty() {
        bail!("Nothing to edit. Pass --title, --summary or --body-file.");
    }
    let article = batch
        .article_mut(id)
        .with_context(|| format!("No article {id} in batch"))?;
    article.apply_edit(edit);
    Ok(())
}

fn cmd_edit(path: &Path, id: Uuid, edit: ArticleEdit) -> Result<()> {
    let mut batch = read_batch(path)?;
    edit_article(&mut batch, id, edit)?;
    write_batch(path, &batch)?;
    tracing::info!(article_id = %id, "Article updated");
    Ok(())
}

async fn cmd_publish(
    path: &Path,
    visibility: Visibility,
    config: PublishConfig,
    credentials: PublishCredentials,
) -> Result<()> {
    let batch = read_batch(path)?;
    if batch.articles.is_empty() {
        println!("No articles to publish in {}", path.display());
        return Ok(());
    }

    let publisher = WordPressPublisher::new().context("Failed to create HTTP client")?;
    let mut session = PublishSession::new(publisher, credentials, config);

    session
        .probe()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Connection check failed")?;

    let results = session
        .publish_all(&batch.articles, visibility, &TracingPublishReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    for (article, result) in batch.articles.iter().zip(&results) {
        println!("{}", describe_result(&article.title, result));
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    eprintln!(
        "Published {} of {} articles as {}",
        succeeded,
        results.len(),
        visibility
    );

    Ok(())
}

fn describe_result(title: &str, result: &PublishResult) -> String {
    match result {
        PublishResult::Published { remote_url, .. } => format!("[ok] {title} -> {remote_url}"),
        PublishResult::Failed { error } => format!("[failed] {title}: {error}"),
    }
}
