use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::models::Product;

/// Persisted expiry date form, e.g. "25/12/2026"
pub const EXPIRY_FORMAT: &str = "%d/%m/%Y";

/// Parse a `DD/MM/YYYY` string into a calendar date. Returns `None` for
/// anything that is not a real date in that form.
pub fn parse_expiry(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.split('/').count() != 3 {
        return None;
    }
    NaiveDate::parse_from_str(value, EXPIRY_FORMAT).ok()
}

/// Render a calendar date back into the persisted `DD/MM/YYYY` form
pub fn format_expiry(date: NaiveDate) -> String {
    date.format(EXPIRY_FORMAT).to_string()
}

/// Classification of a product's expiry date relative to today.
///
/// `Unparseable` is the tagged fail-open outcome for records whose stored
/// date cannot be read: they are never flagged as urgent, but callers can
/// surface the data-quality problem instead of silently reporting `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Ok,
    Unparseable,
}

impl ExpiryStatus {
    /// Short marker for list output
    pub fn tag(self) -> &'static str {
        match self {
            Self::Expired => "EXPIRED",
            Self::ExpiringSoon => "SOON",
            Self::Ok => "OK",
            Self::Unparseable => "?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiring soon",
            Self::Ok => "ok",
            Self::Unparseable => "unreadable date",
        }
    }
}

/// Whole days from `today` until `expiry`; negative once the date has passed.
/// Both sides are calendar dates, so the result is independent of the
/// time of day the check runs.
pub fn days_until(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// Classify an expiry date: past dates are `Expired`, dates within
/// `lead_days` of today (inclusive, counting today itself) are
/// `ExpiringSoon`, everything later is `Ok`.
pub fn classify(expiry: NaiveDate, lead_days: i64, today: NaiveDate) -> ExpiryStatus {
    let diff = days_until(expiry, today);
    if diff < 0 {
        ExpiryStatus::Expired
    } else if diff <= lead_days {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Ok
    }
}

/// Classify a persisted expiry string, tagging unreadable dates instead of
/// failing.
pub fn classify_str(value: &str, lead_days: i64, today: NaiveDate) -> ExpiryStatus {
    match parse_expiry(value) {
        Some(expiry) => classify(expiry, lead_days, today),
        None => ExpiryStatus::Unparseable,
    }
}

/// Compute the instant a reminder for `expiry` should fire: `lead_days`
/// calendar days before the expiry date, at the configured time of day.
///
/// The subtraction is day-granular on the calendar date, never on a
/// timestamp, so a daylight-saving shift between now and the trigger cannot
/// move the alarm off its intended hour. Returns `None` when the computed
/// instant is not strictly in the future; a reminder is never scheduled in
/// the past.
pub fn compute_trigger(
    expiry: NaiveDate,
    lead_days: i64,
    alert_hour: u32,
    alert_minute: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let trigger_day = expiry.checked_sub_days(Days::new(lead_days.max(0) as u64))?;
    let trigger = trigger_day.and_hms_opt(alert_hour, alert_minute, 0)?;
    if trigger <= now {
        return None;
    }
    Some(trigger)
}

/// `compute_trigger` over the persisted expiry string. Unreadable dates
/// yield no trigger.
pub fn compute_trigger_str(
    value: &str,
    lead_days: i64,
    alert_hour: u32,
    alert_minute: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    compute_trigger(parse_expiry(value)?, lead_days, alert_hour, alert_minute, now)
}

/// Per-status counts over the active list, shown as the list header
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub expired: usize,
    pub expiring_soon: usize,
    pub ok: usize,
    pub unparseable: usize,
}

pub fn summarize(products: &[Product], lead_days: i64, today: NaiveDate) -> DashboardCounts {
    let mut counts = DashboardCounts::default();
    for product in products {
        match classify_str(&product.expiry_date, lead_days, today) {
            ExpiryStatus::Expired => counts.expired += 1,
            ExpiryStatus::ExpiringSoon => counts.expiring_soon += 1,
            ExpiryStatus::Ok => counts.ok += 1,
            ExpiryStatus::Unparseable => counts.unparseable += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn parse_accepts_full_dates() {
        assert_eq!(parse_expiry("25/12/2026"), Some(date(2026, 12, 25)));
        assert_eq!(parse_expiry(" 01/01/2027 "), Some(date(2027, 1, 1)));
    }

    #[test]
    fn parse_rejects_missing_separators() {
        assert_eq!(parse_expiry("25122026"), None);
        assert_eq!(parse_expiry("25/122026"), None);
    }

    #[test]
    fn parse_rejects_impossible_dates() {
        assert_eq!(parse_expiry("31/02/2026"), None);
        assert_eq!(parse_expiry("00/01/2026"), None);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("soon"), None);
    }

    #[test]
    fn classify_expired_for_any_past_date() {
        let today = date(2026, 3, 10);
        assert_eq!(classify(date(2026, 3, 9), 3, today), ExpiryStatus::Expired);
        assert_eq!(classify(date(2020, 1, 1), 3, today), ExpiryStatus::Expired);
    }

    #[test]
    fn classify_soon_on_expiry_day() {
        let today = date(2026, 3, 10);
        assert_eq!(classify(today, 3, today), ExpiryStatus::ExpiringSoon);
    }

    #[test]
    fn classify_soon_at_lead_boundary() {
        let today = date(2026, 3, 10);
        assert_eq!(
            classify(date(2026, 3, 13), 3, today),
            ExpiryStatus::ExpiringSoon
        );
    }

    #[test]
    fn classify_ok_just_past_lead_boundary() {
        let today = date(2026, 3, 10);
        assert_eq!(classify(date(2026, 3, 14), 3, today), ExpiryStatus::Ok);
    }

    #[test]
    fn classify_str_tags_unreadable_dates() {
        let today = date(2026, 3, 10);
        assert_eq!(classify_str("??", 3, today), ExpiryStatus::Unparseable);
        assert_eq!(classify_str("09/03/2026", 3, today), ExpiryStatus::Expired);
    }

    #[test]
    fn trigger_lands_lead_days_before_expiry_at_alert_time() {
        let now = datetime(2026, 1, 1, 0, 0);
        assert_eq!(
            compute_trigger(date(2026, 3, 10), 3, 9, 0, now),
            Some(datetime(2026, 3, 7, 9, 0))
        );
    }

    #[test]
    fn trigger_none_when_computed_instant_passed() {
        let now = datetime(2026, 3, 8, 10, 0);
        assert_eq!(compute_trigger(date(2026, 3, 10), 3, 9, 0, now), None);
    }

    #[test]
    fn trigger_none_at_exactly_now() {
        let now = datetime(2026, 3, 7, 9, 0);
        assert_eq!(compute_trigger(date(2026, 3, 10), 3, 9, 0, now), None);
    }

    #[test]
    fn trigger_ignores_time_of_day_of_now() {
        let expected = Some(datetime(2026, 3, 7, 9, 0));
        let morning = datetime(2026, 3, 6, 0, 1);
        let evening = datetime(2026, 3, 6, 23, 59);
        assert_eq!(compute_trigger(date(2026, 3, 10), 3, 9, 0, morning), expected);
        assert_eq!(compute_trigger(date(2026, 3, 10), 3, 9, 0, evening), expected);
    }

    #[test]
    fn trigger_with_zero_lead_fires_on_expiry_day() {
        let now = datetime(2026, 3, 9, 12, 0);
        assert_eq!(
            compute_trigger(date(2026, 3, 10), 0, 9, 30, now),
            Some(datetime(2026, 3, 10, 9, 30))
        );
    }

    #[test]
    fn trigger_str_none_for_unreadable_dates() {
        let now = datetime(2026, 1, 1, 0, 0);
        assert_eq!(compute_trigger_str("soon", 3, 9, 0, now), None);
    }

    #[test]
    fn summarize_counts_each_status() {
        let today = date(2026, 3, 10);
        let mk = |expiry: &str| Product::new("item".to_string(), expiry.to_string());
        let products = vec![
            mk("01/03/2026"), // expired
            mk("11/03/2026"), // soon
            mk("01/06/2026"), // ok
            mk("not-a-date"), // unparseable
            mk("12/03/2026"), // soon
        ];
        let counts = summarize(&products, 3, today);
        assert_eq!(
            counts,
            DashboardCounts {
                expired: 1,
                expiring_soon: 2,
                ok: 1,
                unparseable: 1,
            }
        );
    }
}
