pub mod runner;
pub mod summary;

pub use runner::IngestPipeline;
pub use summary::{OutcomeEntry, RunMode, RunSummary, SourceOutcome, SourceReport};
