pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use config::{AgentConfig, Settings};
pub use pipeline::agent::{AgentPipeline, AgentResult, AskRequest, Confidence};
pub use pipeline::AgentError;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
