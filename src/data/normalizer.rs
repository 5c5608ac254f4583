/// CSV normalization into canonical bond fields
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::classifier::strip_bom;
use super::schema::{schema_for, CanonicalField, ColumnMap};
use crate::error::{IngestError, Result};
use crate::types::{BondFields, Exchange, RawRow};

/// `%d-%b-%y` precedes `%d-%b-%Y`: chrono's `%Y` also accepts two digits
const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %Y",
];

/// Earlier years come from a two-digit year read as four digits
const MIN_YEAR: i32 = 1900;

/// Parse an exchange export into canonical fields, one entry per data row.
///
/// Fails with `EmptyResult` when no data row survives parsing.
pub fn normalize(text: &str, exchange: Exchange) -> Result<Vec<BondFields>> {
    let schema = schema_for(exchange);
    let text = strip_bom(text);

    let mut reader = lenient_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| {
            IngestError::EmptyResult(format!("{} export has no readable header: {}", exchange, e))
        })?
        .iter()
        .map(normalize_header)
        .collect();

    let columns = schema.resolve_columns(&headers);
    debug!(
        "{} header: {} columns, {} mapped to canonical fields",
        exchange,
        headers.len(),
        columns.mapped_count()
    );

    let multiplier = schema.turnover_multiplier();
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                // +2: header is line 1, records() is 0-based
                debug!("Skipping malformed {} row at line {}: {}", exchange, idx + 2, e);
                skipped += 1;
                continue;
            }
        };

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        rows.push(build_fields(&record, &headers, &columns, multiplier));
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyResult(format!(
            "{} export contained no data rows",
            exchange
        )));
    }

    info!("Normalized {} {} rows ({} malformed skipped)", rows.len(), exchange, skipped);
    Ok(rows)
}

/// Lenient parser configuration.
///
/// Exports are inconsistently escaped and rows do not always match the header
/// width, so records of any length are accepted and fields are trimmed.
fn lenient_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .double_quote(true)
        .from_reader(bytes)
}

/// Newlines to spaces, whitespace runs collapsed, trimmed
pub fn normalize_header(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_fields(
    record: &StringRecord,
    headers: &[String],
    columns: &ColumnMap,
    turnover_multiplier: Decimal,
) -> BondFields {
    let raw_data = raw_row(record, headers);

    let cell = |field: CanonicalField| {
        columns
            .get(field)
            .and_then(|idx| record.get(idx))
            .and_then(available)
    };

    BondFields {
        security_code: cell(CanonicalField::SecurityCode).map(str::to_string),
        issuer_name: cell(CanonicalField::IssuerName).map(str::to_string),
        coupon_rate: cell(CanonicalField::CouponRate).and_then(parse_decimal),
        maturity_date: cell(CanonicalField::MaturityDate).and_then(parse_date),
        ltp: cell(CanonicalField::Ltp).and_then(parse_decimal),
        turnover_rs_lacs: cell(CanonicalField::TurnoverRsLacs)
            .and_then(parse_decimal)
            .and_then(|v| scale(v, turnover_multiplier)),
        no_of_trades: cell(CanonicalField::NoOfTrades).and_then(parse_integer),
        bond_type: cell(CanonicalField::BondType).map(str::to_string),
        face_value: cell(CanonicalField::FaceValue).and_then(parse_decimal),
        credit_rating: cell(CanonicalField::CreditRating).map(str::to_string),
        raw_data,
    }
}

/// The full row keyed by label. Repeated labels get `#2`, `#3`...; cells
/// beyond the header are kept as `_extra_1`, `_extra_2`...
fn raw_row(record: &StringRecord, headers: &[String]) -> RawRow {
    let mut raw_data = RawRow::new();

    for (idx, value) in record.iter().enumerate() {
        let key = match headers.get(idx) {
            Some(label) => {
                let mut key = label.clone();
                let mut n = 1;
                while raw_data.contains_key(&key) {
                    n += 1;
                    key = format!("{}#{}", label, n);
                }
                key
            }
            None => format!("_extra_{}", idx + 1 - headers.len()),
        };
        raw_data.insert(key, value.to_string());
    }

    raw_data
}

/// Unit conversion; an overflowing product is treated as not available
fn scale(value: Decimal, multiplier: Decimal) -> Option<Decimal> {
    let scaled = value.checked_mul(multiplier);
    if scaled.is_none() {
        debug!("Turnover {} overflows when scaled by {}", value, multiplier);
    }
    scaled
}

/// `None` for the "value not available" placeholders
fn available(value: &str) -> Option<&str> {
    match value.trim() {
        "" | "-" => None,
        v => Some(v),
    }
}

/// Decimal with thousands separators (and a trailing percent sign) stripped
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned: String = available(value)?
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match Decimal::from_str(cleaned.trim()) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Unparseable number '{}': {}", value, e);
            None
        }
    }
}

pub fn parse_integer(value: &str) -> Option<i64> {
    let cleaned: String = available(value)?.chars().filter(|c| *c != ',').collect();

    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }

    // Some exports render counts as "12.00"
    parse_decimal(&cleaned)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i64())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = available(value)?;
    let parsed = DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .ok()
            .filter(|d| d.year() >= MIN_YEAR)
    });

    if parsed.is_none() {
        debug!("Unparseable date '{}'", value);
    }
    parsed
}
