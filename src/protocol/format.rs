//! Display normalization shared by every adapter.

use serde_json::Value;

/// How an adapter's provider encodes bare numeric durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUnit {
  Seconds,
  Millis,
}

impl RawUnit {
  fn to_seconds(self, raw: u64) -> u64 {
    match self {
      Self::Seconds => raw,
      Self::Millis => raw / 1000,
    }
  }
}

/// `m:ss` with zero-padded seconds. Minutes are not folded into hours.
pub fn format_seconds(total: u64) -> String {
  format!("{}:{:02}", total / 60, total % 60)
}

/// Normalizes a provider duration to `m:ss`.
///
/// Accepts a preformatted timestamp (returned unchanged), a bare number or
/// numeric string interpreted with `unit`, or an object carrying `seconds`
/// or `timestamp`. Anything else, and zero, yields `"0:00"`.
pub fn format_duration(value: &Value, unit: RawUnit) -> String {
  const UNKNOWN: &str = "0:00";

  match value {
    Value::String(s) => {
      let s = s.trim();
      if s.contains(':') {
        return s.to_string();
      }
      match s.parse::<u64>() {
        Ok(0) | Err(_) => UNKNOWN.to_string(),
        Ok(raw) => format_seconds(unit.to_seconds(raw)),
      }
    }
    Value::Number(n) => {
      let raw = n
        .as_u64()
        .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
        .unwrap_or(0);
      if raw == 0 {
        UNKNOWN.to_string()
      } else {
        format_seconds(unit.to_seconds(raw))
      }
    }
    Value::Object(obj) => {
      if let Some(ts) = obj.get("timestamp").and_then(|v| v.as_str()) {
        return ts.to_string();
      }
      match obj.get("seconds").and_then(|v| v.as_u64()) {
        Some(secs) if secs > 0 => format_seconds(secs),
        _ => UNKNOWN.to_string(),
      }
    }
    _ => UNKNOWN.to_string(),
  }
}

/// Parses a view count that may be numeric or a string with separators
/// ("12,345", "1,024 views"). Unparseable input is 0.
pub fn parse_views(value: &Value) -> u64 {
  match value {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
      .unwrap_or(0),
    Value::String(s) => {
      let digits: String = s
        .replace(',', "")
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
      digits.parse().unwrap_or(0)
    }
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn millis_and_seconds_conventions() {
    assert_eq!(format_duration(&json!(125000), RawUnit::Millis), "2:05");
    assert_eq!(format_duration(&json!(125), RawUnit::Seconds), "2:05");
    assert_eq!(format_duration(&json!("125"), RawUnit::Seconds), "2:05");
    assert_eq!(format_duration(&json!("212000"), RawUnit::Millis), "3:32");
  }

  #[test]
  fn timestamps_pass_through() {
    assert_eq!(format_duration(&json!("3:45"), RawUnit::Seconds), "3:45");
    assert_eq!(format_duration(&json!("1:02:03"), RawUnit::Millis), "1:02:03");
    assert_eq!(
      format_duration(&json!({ "timestamp": "4:20", "seconds": 260 }), RawUnit::Seconds),
      "4:20"
    );
  }

  #[test]
  fn seconds_object() {
    assert_eq!(format_duration(&json!({ "seconds": 61 }), RawUnit::Millis), "1:01");
  }

  #[test]
  fn unknown_durations() {
    assert_eq!(format_duration(&Value::Null, RawUnit::Seconds), "0:00");
    assert_eq!(format_duration(&json!(0), RawUnit::Millis), "0:00");
    assert_eq!(format_duration(&json!(""), RawUnit::Seconds), "0:00");
    assert_eq!(format_duration(&json!(false), RawUnit::Seconds), "0:00");
    assert_eq!(format_duration(&json!(-5), RawUnit::Seconds), "0:00");
  }

  #[test]
  fn long_durations_keep_minutes() {
    assert_eq!(format_seconds(3725), "62:05");
  }

  #[test]
  fn views() {
    assert_eq!(parse_views(&json!("12,345")), 12345);
    assert_eq!(parse_views(&json!(42)), 42);
    assert_eq!(parse_views(&Value::Null), 0);
    assert_eq!(parse_views(&json!("1,234,567 views")), 1234567);
    assert_eq!(parse_views(&json!("no views")), 0);
  }
}
