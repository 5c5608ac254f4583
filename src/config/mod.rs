pub mod loader;

pub use loader::{load_config, market_timezone, parse_config};
