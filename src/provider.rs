//! Culture-independent text formatting of scalar values.
//!
//! Format strings follow the familiar `.`-decimal numeric and date pattern
//! conventions (`F2`, `N0`, `X8`, `0.00`, `yyyy-MM-dd`, ...). Output never
//! depends on process locale.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::json;
use crate::value::Scalar;

/// Formats scalars as display text, honoring an optional format string.
///
/// Implementations are shared across threads by the formatters and must
/// not hold mutable state.
pub trait FormatProvider: Send + Sync + std::fmt::Debug {
    fn format_scalar(&self, value: &Scalar, format: Option<&str>, out: &mut String);
}

/// Fixed formatting profile: `.` decimal separator, `,` group separator,
/// English month and day names.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvariantFormat;

impl FormatProvider for InvariantFormat {
    fn format_scalar(&self, value: &Scalar, format: Option<&str>, out: &mut String) {
        let format = format.filter(|f| !f.is_empty());
        match value {
            Scalar::Null => out.push_str("null"),
            Scalar::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Scalar::I64(i) => format_integer(i128::from(*i), format, out),
            Scalar::U64(u) => format_integer(i128::from(*u), format, out),
            Scalar::F64(f) => format_float(*f, format, out),
            Scalar::Char(c) => out.push(*c),
            Scalar::String(s) => out.push_str(s),
            Scalar::Timestamp(ts) => format_timestamp(ts, format, out),
            Scalar::TraceId(id) => {
                let _ = write!(out, "{}", id);
            }
            Scalar::SpanId(id) => {
                let _ = write!(out, "{}", id);
            }
            Scalar::SpanKind(kind) => out.push_str(kind.as_str()),
        }
    }
}

/// Standard numeric format: one letter plus an optional precision.
fn standard_format(format: &str) -> Option<(char, Option<usize>)> {
    let mut chars = format.chars();
    let letter = chars.next().filter(|c| c.is_ascii_alphabetic())?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some((letter, None));
    }
    if rest.len() <= 2 && rest.bytes().all(|b| b.is_ascii_digit()) {
        return rest.parse().ok().map(|p| (letter, Some(p)));
    }
    None
}

fn is_custom_numeric(format: &str) -> bool {
    format.contains(['0', '#'])
}

/// Sign plus decimal digit strings, prior to padding and grouping.
struct NumberParts {
    negative: bool,
    integer: String,
    fraction: String,
}

impl NumberParts {
    fn from_integer(value: i128, decimals: usize) -> Self {
        NumberParts {
            negative: value < 0,
            integer: value.unsigned_abs().to_string(),
            fraction: "0".repeat(decimals),
        }
    }

    fn from_float(value: f64, decimals: usize) -> Self {
        let fixed = format!("{:.*}", decimals, value.abs());
        let (integer, fraction) = match fixed.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (fixed, String::new()),
        };
        let is_zero = integer.bytes().chain(fraction.bytes()).all(|b| b == b'0');
        NumberParts {
            negative: value.is_sign_negative() && !is_zero,
            integer,
            fraction,
        }
    }

    fn write(mut self, min_integer: usize, min_fraction: usize, grouped: bool, out: &mut String) {
        while self.fraction.len() > min_fraction && self.fraction.ends_with('0') {
            self.fraction.pop();
        }

        let integer = if self.integer.len() < min_integer {
            format!("{}{}", "0".repeat(min_integer - self.integer.len()), self.integer)
        } else if min_integer == 0 && self.integer == "0" {
            String::new()
        } else {
            self.integer
        };

        if self.negative {
            out.push('-');
        }
        if grouped {
            for (i, c) in integer.chars().enumerate() {
                if i > 0 && (integer.len() - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(c);
            }
        } else {
            out.push_str(&integer);
        }
        if !self.fraction.is_empty() {
            out.push('.');
            out.push_str(&self.fraction);
        }
    }
}

/// A custom pattern such as `#,##0.00 ms`: literal prefix, digit
/// placeholders, literal suffix.
struct CustomPattern<'a> {
    prefix: &'a str,
    suffix: &'a str,
    min_integer: usize,
    min_fraction: usize,
    max_fraction: usize,
    grouped: bool,
}

impl<'a> CustomPattern<'a> {
    fn parse(format: &'a str) -> Self {
        let is_placeholder = |c: char| matches!(c, '0' | '#' | '.' | ',');
        let start = format.find(is_placeholder).unwrap_or(format.len());
        let end = format
            .rfind(is_placeholder)
            .map(|i| i + 1)
            .unwrap_or(start)
            .max(start);
        let body = &format[start..end];

        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));
        CustomPattern {
            prefix: &format[..start],
            suffix: &format[end..],
            min_integer: integer.matches('0').count(),
            min_fraction: fraction.matches('0').count(),
            max_fraction: fraction.matches(['0', '#']).count(),
            grouped: integer.contains(','),
        }
    }

    fn write(&self, parts: NumberParts, out: &mut String) {
        out.push_str(self.prefix);
        let before = out.len();
        parts.write(self.min_integer, self.min_fraction, self.grouped, out);
        if out.len() == before {
            out.push('0');
        }
        out.push_str(self.suffix);
    }
}

fn format_integer(value: i128, format: Option<&str>, out: &mut String) {
    let Some(format) = format else {
        let _ = write!(out, "{}", value);
        return;
    };

    match standard_format(format) {
        Some(('D' | 'd', precision)) => {
            NumberParts::from_integer(value, 0).write(precision.unwrap_or(1).max(1), 0, false, out);
        }
        Some((letter @ ('X' | 'x'), precision)) => {
            // negative values print as their 64-bit two's complement
            let bits = if value < 0 { value as i64 as u64 as u128 } else { value as u128 };
            let width = precision.unwrap_or(1);
            let _ = if letter == 'X' {
                write!(out, "{:0width$X}", bits, width = width)
            } else {
                write!(out, "{:0width$x}", bits, width = width)
            };
        }
        Some(('N' | 'n', precision)) => {
            let decimals = precision.unwrap_or(2);
            NumberParts::from_integer(value, decimals).write(1, decimals, true, out);
        }
        Some(('F' | 'f', precision)) => {
            let decimals = precision.unwrap_or(2);
            NumberParts::from_integer(value, decimals).write(1, decimals, false, out);
        }
        Some(('E' | 'e' | 'P' | 'p', _)) => format_float(value as f64, Some(format), out),
        _ if is_custom_numeric(format) => {
            let pattern = CustomPattern::parse(format);
            pattern.write(NumberParts::from_integer(value, pattern.max_fraction), out);
        }
        _ => {
            let _ = write!(out, "{}", value);
        }
    }
}

fn format_float(value: f64, format: Option<&str>, out: &mut String) {
    if value.is_nan() {
        out.push_str("NaN");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
        return;
    }
    let Some(format) = format else {
        let _ = write!(out, "{}", value);
        return;
    };

    match standard_format(format) {
        Some(('F' | 'f', precision)) => {
            let decimals = precision.unwrap_or(2);
            NumberParts::from_float(value, decimals).write(1, decimals, false, out);
        }
        Some(('N' | 'n', precision)) => {
            let decimals = precision.unwrap_or(2);
            NumberParts::from_float(value, decimals).write(1, decimals, true, out);
        }
        Some(('P' | 'p', precision)) => {
            let decimals = precision.unwrap_or(2);
            NumberParts::from_float(value * 100.0, decimals).write(1, decimals, true, out);
            out.push_str(" %");
        }
        Some((letter @ ('E' | 'e'), precision)) => {
            let scientific = format!("{:.*e}", precision.unwrap_or(6), value);
            let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            let _ = write!(out, "{}{}{}{:03}", mantissa, letter, sign, exponent.abs());
        }
        _ if is_custom_numeric(format) => {
            let pattern = CustomPattern::parse(format);
            pattern.write(NumberParts::from_float(value, pattern.max_fraction), out);
        }
        _ => {
            let _ = write!(out, "{}", value);
        }
    }
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const DAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

fn format_timestamp(ts: &DateTime<FixedOffset>, format: Option<&str>, out: &mut String) {
    let pattern = match format {
        None | Some("o") | Some("O") => {
            out.push_str(&json::iso8601(ts));
            return;
        }
        Some("u") => {
            let _ = write!(out, "{}", ts.naive_utc().format("%Y-%m-%d %H:%M:%SZ"));
            return;
        }
        Some("s") => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
        Some("d") => "MM/dd/yyyy",
        Some("D") => "dddd, dd MMMM yyyy",
        Some("t") => "HH:mm",
        Some("T") => "HH:mm:ss",
        Some("g") => "MM/dd/yyyy HH:mm",
        Some("G") => "MM/dd/yyyy HH:mm:ss",
        Some(f) if f.chars().count() == 1 => {
            out.push_str(&json::iso8601(ts));
            return;
        }
        Some(f) => f,
    };
    format_custom_timestamp(ts, pattern, out);
}

fn format_custom_timestamp(ts: &DateTime<FixedOffset>, pattern: &str, out: &mut String) {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();

        match c {
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&x| x == c)
                    .map(|p| i + 1 + p)
                    .unwrap_or(chars.len());
                out.extend(&chars[i + 1..end]);
                i = end + 1;
                continue;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            'y' => {
                let _ = match run {
                    1 => write!(out, "{}", ts.year() % 100),
                    2 => write!(out, "{:02}", ts.year() % 100),
                    n => write!(out, "{:0n$}", ts.year(), n = n),
                };
            }
            'M' => {
                let month = ts.month() as usize;
                let _ = match run {
                    1 => write!(out, "{}", month),
                    2 => write!(out, "{:02}", month),
                    3 => write!(out, "{}", &MONTHS[month - 1][..3]),
                    _ => write!(out, "{}", MONTHS[month - 1]),
                };
            }
            'd' => {
                let weekday = ts.weekday().num_days_from_monday() as usize;
                let _ = match run {
                    1 => write!(out, "{}", ts.day()),
                    2 => write!(out, "{:02}", ts.day()),
                    3 => write!(out, "{}", &DAYS[weekday][..3]),
                    _ => write!(out, "{}", DAYS[weekday]),
                };
            }
            'H' => {
                let _ = if run == 1 {
                    write!(out, "{}", ts.hour())
                } else {
                    write!(out, "{:02}", ts.hour())
                };
            }
            'h' => {
                let (_, hour) = ts.hour12();
                let _ = if run == 1 {
                    write!(out, "{}", hour)
                } else {
                    write!(out, "{:02}", hour)
                };
            }
            'm' => {
                let _ = if run == 1 {
                    write!(out, "{}", ts.minute())
                } else {
                    write!(out, "{:02}", ts.minute())
                };
            }
            's' => {
                let _ = if run == 1 {
                    write!(out, "{}", ts.second())
                } else {
                    write!(out, "{:02}", ts.second())
                };
            }
            'f' | 'F' => {
                let nanos = format!("{:09}", ts.nanosecond() % 1_000_000_000);
                let digits = &nanos[..run.min(9)];
                if c == 'f' {
                    out.push_str(digits);
                } else {
                    out.push_str(digits.trim_end_matches('0'));
                }
            }
            't' => {
                let (pm, _) = ts.hour12();
                let designator = if pm { "PM" } else { "AM" };
                out.push_str(if run == 1 { &designator[..1] } else { designator });
            }
            'z' => {
                let seconds = ts.offset().local_minus_utc();
                let sign = if seconds < 0 { '-' } else { '+' };
                let (hours, minutes) = (seconds.abs() / 3600, seconds.abs() % 3600 / 60);
                let _ = match run {
                    1 => write!(out, "{}{}", sign, hours),
                    2 => write!(out, "{}{:02}", sign, hours),
                    _ => write!(out, "{}{:02}:{:02}", sign, hours, minutes),
                };
            }
            'K' => {
                let seconds = ts.offset().local_minus_utc();
                if seconds == 0 {
                    out.push('Z');
                } else {
                    let _ = write!(out, "{}", ts.offset());
                }
            }
            other => {
                for _ in 0..run {
                    out.push(other);
                }
            }
        }
        i += run;
    }
}
