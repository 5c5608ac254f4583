/// Core type definitions for the bond ingester
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange a record was sourced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Session-replay source (server-rendered search form)
    #[serde(rename = "BSE")]
    Bse,
    /// Direct CSV export source
    #[serde(rename = "NSE")]
    Nse,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Bse => "BSE",
            Exchange::Nse => "NSE",
        }
    }

    pub fn all() -> [Exchange; 2] {
        [Exchange::Bse, Exchange::Nse]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BSE" => Some(Exchange::Bse),
            "NSE" => Some(Exchange::Nse),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trading session date. Always a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct TradeDate(NaiveDate);

impl TradeDate {
    /// Returns `None` for Saturdays and Sundays
    pub fn new(date: NaiveDate) -> Option<Self> {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => None,
            _ => Some(TradeDate(date)),
        }
    }

    /// The given date, or the Friday before it when it falls on a weekend
    pub fn on_or_before(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => TradeDate(date - Duration::days(1)),
            Weekday::Sun => TradeDate(date - Duration::days(2)),
            _ => TradeDate(date),
        }
    }

    /// Parse a `YYYY-MM-DD` storage key
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .and_then(TradeDate::new)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The weekday before this one
    pub fn previous(&self) -> Self {
        let mut date = self.0 - Duration::days(1);
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date -= Duration::days(1);
        }
        TradeDate(date)
    }

    /// `DD/MM/YYYY`, as the search form expects it
    pub fn form_text(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// `YYYY-MM-DD`, the storage partition key
    pub fn storage_key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl TryFrom<NaiveDate> for TradeDate {
    type Error = String;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        TradeDate::new(date).ok_or_else(|| format!("{} is not a trading weekday", date))
    }
}

impl From<TradeDate> for NaiveDate {
    fn from(date: TradeDate) -> Self {
        date.0
    }
}

impl fmt::Display for TradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// One parsed row keyed by normalized column label
pub type RawRow = BTreeMap<String, String>;

/// Canonical fields of one traded instrument, before the partition keys are attached
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondFields {
    pub security_code: Option<String>,
    pub issuer_name: Option<String>,
    pub coupon_rate: Option<Decimal>,
    pub maturity_date: Option<NaiveDate>,
    pub ltp: Option<Decimal>,
    pub turnover_rs_lacs: Option<Decimal>,
    pub no_of_trades: Option<i64>,
    pub bond_type: Option<String>,
    pub face_value: Option<Decimal>,
    pub credit_rating: Option<String>,
    pub raw_data: RawRow,
}

impl BondFields {
    pub fn into_record(self, trade_date: TradeDate, exchange: Exchange) -> CanonicalBondRecord {
        CanonicalBondRecord {
            trade_date,
            exchange,
            security_code: self.security_code,
            issuer_name: self.issuer_name,
            coupon_rate: self.coupon_rate,
            maturity_date: self.maturity_date,
            ltp: self.ltp,
            turnover_rs_lacs: self.turnover_rs_lacs,
            no_of_trades: self.no_of_trades,
            bond_type: self.bond_type,
            face_value: self.face_value,
            credit_rating: self.credit_rating,
            raw_data: self.raw_data,
        }
    }
}

/// The unit of storage, partitioned by (trade_date, exchange)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBondRecord {
    pub trade_date: TradeDate,
    pub exchange: Exchange,
    pub security_code: Option<String>,
    pub issuer_name: Option<String>,
    pub coupon_rate: Option<Decimal>,
    pub maturity_date: Option<NaiveDate>,
    pub ltp: Option<Decimal>,
    pub turnover_rs_lacs: Option<Decimal>,
    pub no_of_trades: Option<i64>,
    pub bond_type: Option<String>,
    pub face_value: Option<Decimal>,
    pub credit_rating: Option<String>,
    pub raw_data: RawRow,
}

/// How the session-replay source yields its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BseFetchMode {
    /// Trigger the download control and parse the CSV it emits
    Export,
    /// Read the results grid rendered on the search page
    Table,
}

/// Configuration for the ingester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub bse: BseConfig,

    #[serde(default)]
    pub nse: NseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA zone of the exchanges
    pub market_timezone: String,
    /// Local hour before which the previous session is the latest complete one
    pub cutoff_hour: u32,
    /// Courtesy delay between successive dates
    pub pacing_delay_ms: u64,
    /// Number of trade dates the daily run covers, ending at the resolved date
    pub daily_lookback_days: usize,
    pub request_timeout_sec: u64,
    pub user_agent: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            market_timezone: "Asia/Kolkata".to_string(),
            cutoff_hour: 15,
            pacing_delay_ms: 2000,
            daily_lookback_days: 1,
            request_timeout_sec: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BseConfig {
    pub enabled: bool,
    pub page_url: String,
    pub mode: BseFetchMode,
    /// Element id present on the search page only when trades were found
    pub results_marker_id: String,
    /// Element id of the rendered results grid (table mode)
    pub results_table_id: String,
}

impl Default for BseConfig {
    fn default() -> Self {
        BseConfig {
            enabled: true,
            page_url: "https://www.bseindia.com/markets/debt/DebtCorporateEOD.aspx".to_string(),
            mode: BseFetchMode::Export,
            results_marker_id: "ContentPlaceHolder1_divData".to_string(),
            results_table_id: "ContentPlaceHolder1_gvReport".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NseConfig {
    pub enabled: bool,
    pub url: String,
    pub date_param: String,
    pub date_format: String,
    pub unit_param: String,
}

impl Default for NseConfig {
    fn default() -> Self {
        NseConfig {
            enabled: true,
            url: "https://www.nseindia.com/api/reports/debt/corporate-bonds-traded".to_string(),
            date_param: "date".to_string(),
            date_format: "%d-%m-%Y".to_string(),
            unit_param: "unit".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("data/bonds"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat webhook receiving the run summary; logs only when unset
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub path: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            path: PathBuf::from("data/diagnostics.jsonl"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekend_rejected() {
        let sat = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let sun = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(TradeDate::new(sat).is_none());
        assert!(TradeDate::new(sun).is_none());
    }

    #[test]
    fn test_date_formats() {
        let date = TradeDate::parse("2026-01-28").unwrap();
        assert_eq!(date.form_text(), "28/01/2026");
        assert_eq!(date.storage_key(), "2026-01-28");
        assert_eq!(date.format("%d-%m-%Y"), "28-01-2026");
    }

    #[test]
    fn test_previous_skips_weekend() {
        let mon = TradeDate::parse("2026-02-02").unwrap();
        assert_eq!(mon.previous().storage_key(), "2026-01-30");
    }

    #[test]
    fn test_serde_keeps_weekday_invariant() {
        let date = TradeDate::parse("2026-01-28").unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2026-01-28\"");
        assert_eq!(serde_json::from_str::<TradeDate>(&json).unwrap(), date);

        let err = serde_json::from_str::<TradeDate>("\"2026-01-31\"").unwrap_err();
        assert!(err.to_string().contains("not a trading weekday"));
    }

    #[test]
    fn test_exchange_codes() {
        assert_eq!(Exchange::from_str("nse"), Some(Exchange::Nse));
        assert_eq!(Exchange::from_str("BSE"), Some(Exchange::Bse));
        assert_eq!(Exchange::from_str("MCX"), None);
        assert_eq!(serde_json::to_string(&Exchange::Bse).unwrap(), "\"BSE\"");
    }
}
