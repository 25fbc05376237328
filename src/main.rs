//! # Sukoon CLI (`sukoon`)
//!
//! Runs the bilingual wellness agent from the command line.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sukoon ask "<query>"` | Answer one query and print the result as JSON |
//! | `sukoon request` | Answer a JSON request read from stdin or `--file` |
//! | `sukoon check "<query>"` | Run only the crisis gate |
//! | `sukoon terms` | List the active crisis terms |
//! | `sukoon search "<query>" --corpus <file>` | Semantic search over a JSON corpus |
//!
//! Settings come from the environment (`SUKOON_ORG_ID`, `SUKOON_USER_ID`,
//! `SUKOON_CRISIS_TERMS`, ...). `RUST_LOG` controls log output on stderr.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use sukoon_lib::config::{self, AgentConfig, Settings};
use sukoon_lib::pipeline::agent::{AgentPipeline, AgentResult, AskRequest};
use sukoon_lib::pipeline::rag::embedder::OpenAiEmbedder;
use sukoon_lib::pipeline::rag::retrieval::{
    search_hits, CorpusEntry, InMemoryVectorSearch, SearchFilters,
};

#[derive(Parser)]
#[command(
    name = "sukoon",
    about = "Sukoon: bilingual (English + Roman Urdu) mind-wellness assistant",
    version
)]
struct Cli {
    /// Crisis-term list (one term per line). Overrides SUKOON_CRISIS_TERMS.
    #[arg(long, global = true)]
    crisis_terms: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query.
    Ask {
        query: String,

        #[arg(long)]
        org: Option<String>,

        #[arg(long)]
        user: Option<String>,

        /// Correlation id attached to log lines.
        #[arg(long)]
        trace_id: Option<String>,

        /// Pretty-print the JSON result.
        #[arg(long)]
        pretty: bool,
    },

    /// Answer a JSON request (`{"q": ..., "org_id": ...}`).
    ///
    /// Reads stdin unless `--file` is given.
    Request {
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Report whether a query trips the crisis gate.
    Check { query: String },

    /// Print the active crisis terms.
    Terms,

    /// Embed a JSON corpus and print the top hits for a query.
    ///
    /// Needs OPENAI_API_KEY. The corpus is an array of
    /// `{"org_id", "content", "title"?, "source_url"?, "external_id"?, "ordinal"?}`.
    Search {
        query: String,

        #[arg(long)]
        corpus: PathBuf,

        /// JSON object of filters, e.g. `{"source_url": "..."}`. Malformed input is ignored.
        #[arg(long)]
        filters: Option<String>,

        #[arg(long, default_value_t = 6)]
        top_k: usize,
    },
}

fn main() -> anyhow::Result<()> {
    sukoon_lib::init_tracing();
    let cli = Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let mut settings = Settings::from_env().context("Failed to read settings")?;
    if let Some(path) = cli.crisis_terms {
        settings.crisis_terms_path = Some(path);
    }

    match cli.command {
        Commands::Check { query } => {
            let pipeline = build_pipeline(settings)?;
            let verdict = if pipeline.is_crisis_query(&query) {
                "crisis"
            } else {
                "ok"
            };
            println!("{verdict}");
        }
        Commands::Terms => {
            let pipeline = build_pipeline(settings)?;
            for term in pipeline.crisis_terms().iter() {
                println!("{term}");
            }
        }
        Commands::Search {
            query,
            corpus,
            filters,
            top_k,
        } => {
            let embedder = OpenAiEmbedder::from_settings(&settings)?;
            tracing::info!(model = embedder.model(), "Embedding corpus");

            let raw = std::fs::read_to_string(&corpus)
                .with_context(|| format!("Failed to read {}", corpus.display()))?;
            let entries: Vec<CorpusEntry> =
                serde_json::from_str(&raw).context("Corpus is not a valid JSON array")?;
            let store = InMemoryVectorSearch::from_corpus(entries, &embedder)?;

            let mut filters = SearchFilters::from_json(filters.as_deref());
            if filters.org_id.is_none() {
                filters.org_id = Some(settings.org_id.clone());
            }
            let hits = search_hits(&query, &embedder, &store, top_k, &filters)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Commands::Ask {
            query,
            org,
            user,
            trace_id,
            pretty,
        } => {
            let pipeline = build_pipeline(settings)?;
            let request = AskRequest {
                q: Some(query),
                org_id: org,
                user_id: user,
                trace_id,
                ..AskRequest::default()
            };
            print_result(&pipeline.run(request)?, pretty)?;
        }
        Commands::Request { file, pretty } => {
            let pipeline = build_pipeline(settings)?;
            let raw = read_request(file.as_deref())?;
            let request: AskRequest =
                serde_json::from_str(&raw).context("Request is not valid JSON")?;
            print_result(&pipeline.run(request)?, pretty)?;
        }
    }

    Ok(())
}

fn build_pipeline(settings: Settings) -> anyhow::Result<AgentPipeline> {
    let config = AgentConfig::load(settings).context("Failed to load crisis terms")?;
    Ok(AgentPipeline::from_config(&config))
}

fn read_request(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_result(result: &AgentResult, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
