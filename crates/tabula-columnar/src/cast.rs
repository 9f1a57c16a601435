//! Text casts between the engine's `VARCHAR` representation and the other
//! logical types. The reader materializes every cell as text first and casts
//! per column; the writer projects typed columns back to text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::types::LogicalType;
use crate::vector::Value;

const MICROS_PER_SECOND: i64 = 1_000_000;

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("unix epoch is a valid date")
}

/// Cast `text` to `ty`, returning a human-readable detail on failure.
///
/// The detail string becomes the suffix of a cell-qualified conversion error,
/// so it names the offending value and the target type.
pub fn cast_text(text: &str, ty: LogicalType) -> Result<Value, String> {
    let text = text.trim();
    match ty {
        LogicalType::Boolean => parse_boolean(text).map(Value::Boolean),
        LogicalType::BigInt => parse_bigint(text).map(Value::BigInt),
        LogicalType::Double => parse_double(text).map(Value::Double),
        LogicalType::Date => parse_date(text).map(Value::Date),
        LogicalType::Time => parse_time(text).map(Value::Time),
        LogicalType::Timestamp => parse_timestamp(text).map(Value::Timestamp),
        LogicalType::TimestampSeconds => parse_timestamp(text)
            .map(|us| Value::TimestampSeconds(us.div_euclid(MICROS_PER_SECOND))),
        LogicalType::Varchar => Ok(Value::Varchar(text.into())),
    }
}

pub fn parse_boolean(text: &str) -> Result<bool, String> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Ok(false)
    } else {
        Err(format!("could not convert '{text}' to BOOLEAN"))
    }
}

pub fn parse_bigint(text: &str) -> Result<i64, String> {
    text.parse::<i64>()
        .map_err(|_| format!("could not convert '{text}' to BIGINT"))
}

pub fn parse_double(text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| format!("could not convert '{text}' to DOUBLE"))
}

/// Parse an ISO `YYYY-MM-DD` date into days since the Unix epoch.
pub fn parse_date(text: &str) -> Result<i32, String> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("could not convert '{text}' to DATE"))?;
    Ok((date - epoch_date()).num_days() as i32)
}

/// Parse an `HH:MM:SS[.ffffff]` time into microseconds since midnight.
pub fn parse_time(text: &str) -> Result<i64, String> {
    let time = NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .map_err(|_| format!("could not convert '{text}' to TIME"))?;
    Ok(time.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND
        + (time.nanosecond() / 1_000) as i64)
}

/// Parse a timestamp (space- or `T`-separated, optional fractional seconds,
/// bare dates allowed) into microseconds since the Unix epoch.
pub fn parse_timestamp(text: &str) -> Result<i64, String> {
    let formats = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.and_utc().timestamp_micros());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(dt.and_utc().timestamp_micros());
    }
    Err(format!("could not convert '{text}' to TIMESTAMP"))
}

/// Render a typed value as the text the engine would display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Date(days) => format_date(*days),
        Value::Time(us) => format_time(*us),
        Value::Timestamp(us) => format_timestamp(*us),
        Value::TimestampSeconds(secs) => format_timestamp(secs * MICROS_PER_SECOND),
        Value::Varchar(s) => s.to_string(),
    }
}

pub fn format_date(days: i32) -> String {
    match epoch_date().checked_add_signed(chrono::Duration::days(days as i64)) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

pub fn format_time(micros_of_day: i64) -> String {
    let secs = micros_of_day.div_euclid(MICROS_PER_SECOND);
    let micros = micros_of_day.rem_euclid(MICROS_PER_SECOND);
    match NaiveTime::from_num_seconds_from_midnight_opt(secs as u32, micros as u32 * 1_000) {
        Some(time) if micros != 0 => time.format("%H:%M:%S%.6f").to_string(),
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

pub fn format_timestamp(epoch_micros: i64) -> String {
    match DateTime::from_timestamp_micros(epoch_micros) {
        Some(dt) if epoch_micros % MICROS_PER_SECOND != 0 => {
            dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
        }
        Some(dt) => dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn boolean_accepts_engine_spellings() {
        assert_eq!(parse_boolean("true"), Ok(true));
        assert_eq!(parse_boolean("FALSE"), Ok(false));
        assert_eq!(parse_boolean("1"), Ok(true));
        assert_eq!(parse_boolean("0"), Ok(false));
        assert!(parse_boolean("yes").is_err());
    }

    #[test]
    fn date_roundtrips_through_days() {
        let days = parse_date("2022-01-01").unwrap();
        assert_eq!(days, 18993);
        assert_eq!(format_date(days), "2022-01-01");
        assert_eq!(parse_date("1969-12-31").unwrap(), -1);
    }

    #[test]
    fn time_parses_fractional_seconds() {
        assert_eq!(parse_time("12:00:00").unwrap(), 43_200_000_000);
        assert_eq!(parse_time("00:00:00.000250").unwrap(), 250);
        assert_eq!(format_time(43_200_000_000), "12:00:00");
    }

    #[test]
    fn timestamp_accepts_space_and_t_separators() {
        let a = parse_timestamp("2022-01-01 00:00:00").unwrap();
        let b = parse_timestamp("2022-01-01T00:00:00").unwrap();
        let c = parse_timestamp("2022-01-01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, 18993 * 86_400 * MICROS_PER_SECOND);
    }

    #[test]
    fn cast_detail_names_value_and_type() {
        let err = cast_text("abc", LogicalType::Double).unwrap_err();
        assert_eq!(err, "could not convert 'abc' to DOUBLE");
    }
}
