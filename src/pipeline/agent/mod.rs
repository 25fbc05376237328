pub mod orchestrator;
pub mod stages;
pub mod topic;
pub mod types;

pub use orchestrator::AgentPipeline;
pub use stages::{ConfidencePolicy, FixedConfidence};
pub use types::{AgentResult, AskRequest, Confidence, Scope};
