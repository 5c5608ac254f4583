/// Trade date resolution for market sessions
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

use crate::types::TradeDate;

/// Latest complete trading session as of `now`.
///
/// Before `cutoff_hour` (market-local) today's session is not settled yet, so
/// the previous calendar day is taken. A weekend result then rolls back to
/// Friday; the two adjustments compose.
pub fn resolve_trade_date<Tz: TimeZone>(
    now: DateTime<Utc>,
    market_tz: &Tz,
    cutoff_hour: u32,
) -> TradeDate {
    let local = now.with_timezone(market_tz);

    let mut date = local.date_naive();
    if local.hour() < cutoff_hour {
        date -= Duration::days(1);
    }

    TradeDate::on_or_before(date)
}

/// Every weekday in `[from, to]`, oldest first
pub fn trade_dates_between(from: NaiveDate, to: NaiveDate) -> Vec<TradeDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter_map(TradeDate::new)
        .collect()
}

/// The `count` trade dates ending at `anchor`, oldest first
pub fn recent_trade_dates(anchor: TradeDate, count: usize) -> Vec<TradeDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = anchor;
    for _ in 0..count {
        dates.push(current);
        current = current.previous();
    }
    dates.reverse();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset, Weekday};
    use chrono_tz::Asia::Kolkata;
    use proptest::prelude::*;

    fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Kolkata
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_after_cutoff_uses_today() {
        // Wednesday 16:00 IST
        let date = resolve_trade_date(ist(2026, 1, 28, 16, 0), &Kolkata, 15);
        assert_eq!(date.storage_key(), "2026-01-28");
    }

    #[test]
    fn test_before_cutoff_uses_yesterday() {
        // Wednesday 10:30 IST
        let date = resolve_trade_date(ist(2026, 1, 28, 10, 30), &Kolkata, 15);
        assert_eq!(date.storage_key(), "2026-01-27");
    }

    #[test]
    fn test_weekend_rolls_back_to_friday() {
        let sat = resolve_trade_date(ist(2026, 1, 31, 18, 0), &Kolkata, 15);
        let sun = resolve_trade_date(ist(2026, 2, 1, 18, 0), &Kolkata, 15);
        assert_eq!(sat.storage_key(), "2026-01-30");
        assert_eq!(sun.storage_key(), "2026-01-30");
    }

    #[test]
    fn test_cutoff_step_then_weekend_roll() {
        // Monday morning steps back to Sunday, which then rolls to Friday
        let date = resolve_trade_date(ist(2026, 2, 2, 9, 0), &Kolkata, 15);
        assert_eq!(date.storage_key(), "2026-01-30");
    }

    #[test]
    fn test_local_shift_crosses_midnight() {
        // 20:00 UTC Tuesday is 01:30 IST Wednesday, before cutoff -> Tuesday
        let now = Utc.with_ymd_and_hms(2026, 1, 27, 20, 0, 0).unwrap();
        let date = resolve_trade_date(now, &Kolkata, 15);
        assert_eq!(date.storage_key(), "2026-01-27");
    }

    #[test]
    fn test_fixed_offset_zone() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(); // 15:30 local
        assert_eq!(resolve_trade_date(now, &offset, 15).storage_key(), "2026-01-28");
    }

    #[test]
    fn test_trade_dates_between_skips_weekends() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let keys: Vec<String> = trade_dates_between(from, to)
            .iter()
            .map(|d| d.storage_key())
            .collect();
        assert_eq!(keys, vec!["2026-01-29", "2026-01-30", "2026-02-02", "2026-02-03"]);
    }

    #[test]
    fn test_trade_dates_between_empty_when_reversed() {
        let from = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        assert!(trade_dates_between(from, to).is_empty());
    }

    #[test]
    fn test_recent_trade_dates() {
        let anchor = TradeDate::parse("2026-02-02").unwrap();
        let keys: Vec<String> = recent_trade_dates(anchor, 3)
            .iter()
            .map(|d| d.storage_key())
            .collect();
        assert_eq!(keys, vec!["2026-01-29", "2026-01-30", "2026-02-02"]);
    }

    proptest! {
        #[test]
        fn prop_never_weekend(secs in 1_600_000_000i64..1_900_000_000i64, cutoff in 0u32..24) {
            let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let date = resolve_trade_date(now, &Kolkata, cutoff).date();
            prop_assert!(!matches!(date.weekday(), Weekday::Sat | Weekday::Sun));
        }

        #[test]
        fn prop_never_after_local_today(
            secs in 1_600_000_000i64..1_900_000_000i64,
            cutoff in 0u32..24
        ) {
            let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let local_today = now.with_timezone(&Kolkata).date_naive();
            let date = resolve_trade_date(now, &Kolkata, cutoff).date();
            prop_assert!(date <= local_today);
            prop_assert!(local_today - date <= Duration::days(3));
        }
    }
}
