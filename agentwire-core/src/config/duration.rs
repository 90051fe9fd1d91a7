//! Duration fields: Go-style text (`"2m"`, `"500ms"`, `"1h30m"`) or integer nanoseconds
//!
//! Use with `#[serde(with = "duration")]`.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").expect("duration pattern is a valid regex")
});

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        _ => 3600e9,
    }
}

/// Parse a Go-style duration string
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text.starts_with('-') {
        return Err(format!("negative duration '{}'", text));
    }

    let mut nanos = 0f64;
    let mut consumed = 0;
    for caps in SEGMENT.captures_iter(text) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        if whole.start != consumed {
            break;
        }
        consumed = whole.end;

        let amount: f64 = caps[1]
            .parse()
            .map_err(|_| format!("invalid number in duration '{}'", text))?;
        nanos += amount * unit_nanos(&caps[2]);
    }

    if consumed != text.len() {
        return Err(format!(
            "invalid duration '{}': expected segments like 1h, 30m, 1.5s, 500ms",
            text
        ));
    }
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(format!("duration '{}' is out of range", text));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Render a duration in the same textual form `parse_duration` accepts
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let mut out = String::new();
    let total_secs = duration.as_secs();
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);
    let nanos = duration.subsec_nanos();

    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    if nanos > 0 {
        if nanos % 1_000_000 == 0 {
            out.push_str(&format!("{}ms", nanos / 1_000_000));
        } else if nanos % 1_000 == 0 {
            out.push_str(&format!("{}us", nanos / 1_000));
        } else {
            out.push_str(&format!("{}ns", nanos));
        }
    }
    out
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration string such as \"2m\" or an integer number of nanoseconds")
    }

    fn visit_u64<E: de::Error>(self, nanos: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(nanos))
    }

    fn visit_i64<E: de::Error>(self, nanos: i64) -> Result<Duration, E> {
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom(format!("negative duration {}", nanos)))
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Duration, E> {
        parse_duration(text).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use test_case::test_case;

    #[test_case("2m", Duration::from_secs(120); "minutes")]
    #[test_case("500ms", Duration::from_millis(500); "millis")]
    #[test_case("1h30m", Duration::from_secs(5400); "compound")]
    #[test_case("1.5s", Duration::from_millis(1500); "fractional")]
    #[test_case("90s", Duration::from_secs(90); "seconds")]
    #[test_case("10us", Duration::from_micros(10); "micros")]
    #[test_case("0", Duration::ZERO; "bare zero")]
    fn test_parse_duration(text: &str, expected: Duration) {
        assert_eq!(parse_duration(text).unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("10"; "missing unit")]
    #[test_case("5d"; "unknown unit")]
    #[test_case("-1s"; "negative")]
    #[test_case("1m xx"; "trailing garbage")]
    fn test_parse_duration_rejects(text: &str) {
        assert!(parse_duration(text).is_err());
    }

    #[test]
    fn test_format_round_trips() {
        for d in [
            Duration::from_secs(120),
            Duration::from_millis(1500),
            Duration::from_secs(5400),
            Duration::from_nanos(7),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
    }

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        value: Duration,
    }

    #[test]
    fn test_serde_text_and_nanos() {
        let text: Holder = serde_json::from_str(r#"{"value": "2m"}"#).unwrap();
        assert_eq!(text.value, Duration::from_secs(120));

        let nanos: Holder = serde_json::from_str(r#"{"value": 1000000000}"#).unwrap();
        assert_eq!(nanos.value, Duration::from_secs(1));

        assert!(serde_json::from_str::<Holder>(r#"{"value": -5}"#).is_err());
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"value":"2m"}"#);
    }
}
