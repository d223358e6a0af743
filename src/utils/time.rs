//! Time and timestamp utilities

use chrono::{DateTime, Days, Local, NaiveDate, SubsecRound, TimeZone, Utc};

/// Capture time for a visit, truncated to millisecond precision
pub fn capture_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Start of the calendar day containing `now`, in `now`'s timezone
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let date = now.date_naive();
    midnight(&now.timezone(), date)
}

/// Midnight `days` calendar days before the day containing `now`
pub fn days_before_start_of_day<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> DateTime<Utc> {
    let date = now.date_naive();
    let date = date.checked_sub_days(Days::new(days)).unwrap_or(date);
    midnight(&now.timezone(), date)
}

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    // DST gaps can swallow local midnight; fall back to treating it as UTC
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Human-readable local time for the admin dashboard
pub fn format_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
