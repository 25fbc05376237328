pub mod citation;
pub mod compose;
pub mod curate;
pub mod embedder;
pub mod retrieval;
pub mod snippet;
pub mod synthesis;
