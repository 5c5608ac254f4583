pub mod resolver;

pub use resolver::{recent_trade_dates, resolve_trade_date, trade_dates_between};
