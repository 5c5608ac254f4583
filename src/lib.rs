pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod sources;
pub mod storage;
pub mod time;
pub mod types;
pub mod utils;

pub use error::{IngestError, Result};
pub use types::*;
