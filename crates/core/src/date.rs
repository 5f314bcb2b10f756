use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Lower-case Brazilian Portuguese month abbreviations
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2022-03-01T10:00:00Z`) and the `+0000` offset style
/// the CMS emits (`2022-03-01T10:00:00+0000`).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Format a publication date as `dd MMM yyyy` with pt-BR month names,
/// e.g. `01 mar 2022`. Missing dates render as an empty string.
pub fn format_publication_date(published_at: Option<DateTime<Utc>>) -> String {
    match published_at {
        Some(dt) => format_date(dt.date_naive()),
        None => String::new(),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS_PT_BR[date.month0() as usize],
        date.year()
    )
}

/// Inverse of [`format_date`]
pub fn parse_display_date(display: &str) -> Option<NaiveDate> {
    let mut parts = display.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month_name = parts.next()?.to_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = MONTHS_PT_BR.iter().position(|m| *m == month_name)? as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}
