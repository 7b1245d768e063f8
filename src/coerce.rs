//! Best-effort conversion of config values into typed scalars.
//!
//! Every conversion is total: input that cannot be interpreted as the target
//! type yields that type's zero value (`""`, `0`, `false`, `Duration::ZERO`,
//! the Unix epoch). A malformed override must not take a service down, so
//! nothing in here returns an error.
//!
//! String rendering underpins everything else, since environment values always
//! arrive as strings: `8080` in a file and `"8080"` from `APP_SERVER_PORT`
//! coerce to the same integer.

use crate::types::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Types that can be produced from any [`Value`] without failing.
pub trait Coerce: Sized {
    fn coerce(value: &Value) -> Self;
}

/// Render a value as a string.
///
/// Floats use the shortest digits that round-trip (see [`format_float`]), bytes become
/// lowercase hex, sequences are comma-joined and mappings become comma-joined
/// `key=value` pairs in key order.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => s.clone(),
        Value::Bytes(b) => hex::encode(b),
        Value::Duration(d) => humantime::format_duration(*d).to_string(),
        Value::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Seq(items) => items.iter().map(to_string).collect::<Vec<_>>().join(","),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, to_string(v)))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Render a float with the fewest digits that parse back to the same value.
///
/// Decimal exponents below -4 or at least 6 switch to exponent form with a
/// signed, two-digit minimum exponent: `1e+21`, `1.5e-07`, `1.234567e+06`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let sci = format!("{:e}", f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return f.to_string();
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..6).contains(&exp) {
        return f.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

fn float_to_i64(f: f64) -> i64 {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        f.trunc() as i64
    } else {
        0
    }
}

fn float_to_u64(f: f64) -> u64 {
    if f.is_finite() && f >= 0.0 && f <= u64::MAX as f64 {
        f.trunc() as u64
    } else {
        0
    }
}

pub fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::Uint(u) => i64::try_from(*u).unwrap_or(0),
        Value::Float(f) => float_to_i64(*f),
        Value::Duration(d) => i64::try_from(d.as_nanos()).unwrap_or(0),
        Value::Timestamp(t) => t.timestamp(),
        other => to_string(other).trim().parse().unwrap_or(0),
    }
}

pub fn to_u64(value: &Value) -> u64 {
    match value {
        Value::Int(i) => u64::try_from(*i).unwrap_or(0),
        Value::Uint(u) => *u,
        Value::Float(f) => float_to_u64(*f),
        Value::Duration(d) => u64::try_from(d.as_nanos()).unwrap_or(0),
        Value::Timestamp(t) => u64::try_from(t.timestamp()).unwrap_or(0),
        other => to_string(other).trim().parse().unwrap_or(0),
    }
}

pub fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Uint(u) => *u as f64,
        Value::Float(f) => *f,
        other => to_string(other).trim().parse().unwrap_or(0.0),
    }
}

/// Accepts `true/false/t/f/1/0` in any case; anything else is `false`.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => {
            let s = to_string(other);
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("t") || s == "1"
        }
    }
}

/// Parse a duration literal such as `5s`, `100ms` or `1h30m`.
///
/// A bare integer is taken as nanoseconds, matching how numeric values from a
/// decoded document are interpreted.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(nanos) = s.parse::<u64>() {
        return Some(Duration::from_nanos(nanos));
    }
    humantime::parse_duration(s).ok()
}

pub fn to_duration(value: &Value) -> Duration {
    match value {
        Value::Duration(d) => *d,
        Value::Int(i) => u64::try_from(*i).map(Duration::from_nanos).unwrap_or_default(),
        Value::Uint(u) => Duration::from_nanos(*u),
        Value::Float(f) => Duration::from_nanos(float_to_u64(*f)),
        other => parse_duration(&to_string(other)).unwrap_or_default(),
    }
}

/// Parse a timestamp, trying in order: integer Unix seconds, RFC3339,
/// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and the Unix `date` format
/// (`Mon Jan 2 15:04:05 MST 2006`). Zone-less forms are read as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    // The zone abbreviation is skipped, not interpreted.
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Z %Y")
        .ok()
        .map(|dt| dt.and_utc())
}

pub fn to_timestamp(value: &Value) -> DateTime<Utc> {
    let parsed = match value {
        Value::Timestamp(t) => Some(*t),
        Value::Int(i) => DateTime::from_timestamp(*i, 0),
        Value::Uint(u) => i64::try_from(*u).ok().and_then(|s| DateTime::from_timestamp(s, 0)),
        Value::Float(f) => DateTime::from_timestamp(float_to_i64(*f), 0),
        other => parse_timestamp(&to_string(other)),
    };
    parsed.unwrap_or_default()
}

/// Convert a sequence, or the comma-separated string form of anything else,
/// element by element. Elements that do not parse become zero values; they do
/// not abort the whole slice.
pub fn to_slice<T>(value: &Value, f: impl Fn(&Value) -> T) -> Vec<T> {
    match value {
        Value::Null => Vec::new(),
        Value::Seq(items) => items.iter().map(f).collect(),
        other => {
            let s = to_string(other);
            if s.is_empty() {
                return Vec::new();
            }
            s.split(',')
                .map(|part| f(&Value::String(part.trim().to_string())))
                .collect()
        }
    }
}

fn parse_pairs<I, S>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = BTreeMap::new();
    for entry in entries {
        let entry = entry.as_ref().trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('=') {
            Some((k, v)) => map.insert(k.trim().to_string(), v.trim().to_string()),
            // A bare key is a flag.
            None => map.insert(entry.to_string(), "true".to_string()),
        };
    }
    map
}

/// Convert a value to a string map.
///
/// Mappings keep every entry whose value renders non-empty. Sequences and
/// comma-separated strings are read as `key=value` entries, where a bare `key`
/// means `key=true`.
pub fn to_string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Null => BTreeMap::new(),
        Value::Map(map) => map
            .iter()
            .filter_map(|(k, v)| {
                let s = to_string(v);
                (!s.is_empty()).then(|| (k.clone(), s))
            })
            .collect(),
        Value::Seq(items) => parse_pairs(items.iter().map(to_string)),
        other => parse_pairs(to_string(other).split(',')),
    }
}

impl Coerce for String {
    fn coerce(value: &Value) -> Self {
        to_string(value)
    }
}

impl Coerce for bool {
    fn coerce(value: &Value) -> Self {
        to_bool(value)
    }
}

impl Coerce for i64 {
    fn coerce(value: &Value) -> Self {
        to_i64(value)
    }
}

impl Coerce for u64 {
    fn coerce(value: &Value) -> Self {
        to_u64(value)
    }
}

macro_rules! impl_coerce_narrow {
    ($via:ident => $($t:ty),*) => {
        $(impl Coerce for $t {
            fn coerce(value: &Value) -> Self {
                <$t>::try_from($via(value)).unwrap_or(0)
            }
        })*
    };
}

impl_coerce_narrow!(to_i64 => i8, i16, i32, isize);
impl_coerce_narrow!(to_u64 => u8, u16, u32, usize);

impl Coerce for f64 {
    fn coerce(value: &Value) -> Self {
        to_f64(value)
    }
}

impl Coerce for f32 {
    fn coerce(value: &Value) -> Self {
        to_f64(value) as f32
    }
}

impl Coerce for Duration {
    fn coerce(value: &Value) -> Self {
        to_duration(value)
    }
}

impl Coerce for DateTime<Utc> {
    fn coerce(value: &Value) -> Self {
        to_timestamp(value)
    }
}

impl<T: Coerce> Coerce for Vec<T> {
    fn coerce(value: &Value) -> Self {
        to_slice(value, T::coerce)
    }
}

impl Coerce for BTreeMap<String, String> {
    fn coerce(value: &Value) -> Self {
        to_string_map(value)
    }
}

impl Coerce for Value {
    fn coerce(value: &Value) -> Self {
        value.clone()
    }
}
