pub mod crisis;
pub mod escalation;
pub mod sanitize;
