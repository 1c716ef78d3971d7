//! Minimal JSON writing primitives shared by the formatters.
//!
//! String escaping is delegated to `serde_json`; everything else here is
//! literal punctuation and number/timestamp text.

use std::io::{self, Write};

use chrono::{DateTime, Offset, TimeZone};

/// Write `value` as a quoted, escaped JSON string.
pub fn write_str<W: Write + ?Sized>(out: &mut W, value: &str) -> io::Result<()> {
    serde_json::to_writer(out, value).map_err(io::Error::from)
}

pub fn write_i64<W: Write + ?Sized>(out: &mut W, value: i64) -> io::Result<()> {
    write!(out, "{}", value)
}

pub fn write_u64<W: Write + ?Sized>(out: &mut W, value: u64) -> io::Result<()> {
    write!(out, "{}", value)
}

/// Finite floats become JSON numbers; NaN and infinities have no JSON
/// literal and are written as quoted strings.
pub fn write_f64<W: Write + ?Sized>(out: &mut W, value: f64) -> io::Result<()> {
    if value.is_nan() {
        out.write_all(b"\"NaN\"")
    } else if value.is_infinite() {
        if value > 0.0 {
            out.write_all(b"\"Infinity\"")
        } else {
            out.write_all(b"\"-Infinity\"")
        }
    } else {
        serde_json::to_writer(out, &value).map_err(io::Error::from)
    }
}

/// ISO-8601 round-trip text: nine fractional digits, `Z` for UTC.
pub fn iso8601<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if ts.offset().fix().local_minus_utc() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.9f%:z").to_string()
    }
}

/// Write a timestamp as a quoted ISO-8601 string.
pub fn write_timestamp<W, Tz>(out: &mut W, ts: &DateTime<Tz>) -> io::Result<()>
where
    W: Write + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    write!(out, "\"{}\"", iso8601(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn written(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn escapes_strings() {
        assert_eq!(
            written(|w| write_str(w, "a\"b\\c\n\u{1}")),
            r#""a\"b\\c\n\u0001""#
        );
    }

    #[test]
    fn non_finite_floats_are_strings() {
        assert_eq!(written(|w| write_f64(w, f64::NAN)), r#""NaN""#);
        assert_eq!(written(|w| write_f64(w, f64::NEG_INFINITY)), r#""-Infinity""#);
        assert_eq!(written(|w| write_f64(w, 1.5)), "1.5");
    }

    #[test]
    fn timestamps_round_trip() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(iso8601(&utc), "2024-03-01T12:30:05.000000000Z");

        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        let local = utc.with_timezone(&offset);
        assert_eq!(iso8601(&local), "2024-03-01T22:30:05.000000000+10:00");

        let parsed = DateTime::parse_from_rfc3339(&iso8601(&local)).unwrap();
        assert_eq!(parsed, local);
    }
}
