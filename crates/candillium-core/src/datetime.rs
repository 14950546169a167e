use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;

const TIMEZONE_ENV_VAR: &str =
  "CANDILLIUM_TIMEZONE";

pub const INVALID_DATE: &str =
  "Invalid Date";

/// Parses the date-like text stored in
/// `lastInterview`.
///
/// Accepts full RFC 3339 timestamps,
/// naive date-times (read as UTC) and
/// bare `YYYY-MM-DD` dates (midnight
/// UTC).
#[must_use]
pub fn parse_interview_date(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(
      trimmed
    )
  {
    return Some(
      dt.with_timezone(&Utc)
    );
  }

  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S"
  ] {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        trimmed, fmt
      )
    {
      return Some(naive.and_utc());
    }
  }

  NaiveDate::parse_from_str(
    trimmed, "%Y-%m-%d"
  )
  .ok()
  .and_then(|date| {
    date.and_hms_opt(0, 0, 0)
  })
  .map(|naive| naive.and_utc())
}

/// Missing and unparseable dates sort
/// as the earliest representable
/// instant.
#[must_use]
pub fn interview_sort_key(
  raw: Option<&str>
) -> DateTime<Utc> {
  raw
    .and_then(parse_interview_date)
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[must_use]
pub fn format_interview_date(
  raw: Option<&str>,
  tz: &Tz
) -> String {
  match raw
    .and_then(parse_interview_date)
  {
    | Some(dt) => dt
      .with_timezone(tz)
      .format("%Y-%m-%d")
      .to_string(),
    | None => INVALID_DATE.to_string()
  }
}

/// Environment wins over the configured
/// value; UTC when neither parses.
pub fn resolve_display_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  configured
    .and_then(|raw| {
      parse_timezone(raw, "config")
    })
    .unwrap_or(chrono_tz::UTC)
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved display timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "invalid timezone; ignoring"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::{
    INVALID_DATE,
    format_interview_date,
    interview_sort_key,
    parse_interview_date
  };

  #[test]
  fn parses_bare_date_as_utc_midnight()
  {
    let parsed =
      parse_interview_date("2023-06-15")
        .expect("parse date");
    assert_eq!(
      parsed,
      Utc
        .with_ymd_and_hms(
          2023, 6, 15, 0, 0, 0
        )
        .single()
        .expect("valid instant")
    );
  }

  #[test]
  fn parses_rfc3339_with_offset() {
    let parsed = parse_interview_date(
      "2023-06-15T10:30:00-05:00"
    )
    .expect("parse timestamp");
    assert_eq!(
      parsed,
      Utc
        .with_ymd_and_hms(
          2023, 6, 15, 15, 30, 0
        )
        .single()
        .expect("valid instant")
    );
  }

  #[test]
  fn parses_naive_datetime_with_fraction()
  {
    assert!(
      parse_interview_date(
        "2023-06-15T10:30:00.250"
      )
      .is_some()
    );
  }

  #[test]
  fn garbage_sorts_as_minimum() {
    assert_eq!(
      interview_sort_key(Some(
        "next tuesday"
      )),
      chrono::DateTime::<Utc>::MIN_UTC
    );
    assert_eq!(
      interview_sort_key(None),
      chrono::DateTime::<Utc>::MIN_UTC
    );
    assert_eq!(
      interview_sort_key(Some("")),
      chrono::DateTime::<Utc>::MIN_UTC
    );
  }

  #[test]
  fn formats_in_display_timezone() {
    let tz: chrono_tz::Tz =
      "America/Mexico_City"
        .parse()
        .expect("tz");
    assert_eq!(
      format_interview_date(
        Some("2023-06-15T02:00:00Z"),
        &tz
      ),
      "2023-06-14"
    );
    assert_eq!(
      format_interview_date(None, &tz),
      INVALID_DATE
    );
  }
}
