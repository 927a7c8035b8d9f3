//! Timestamp columns as the hosted
//! database sends them.
//!
//! Writes use `YYYY-MM-DDTHH:MM:SS`.
//! Reads accept that, the minute-only
//! form produced by browser date/time
//! inputs, a space separator, and RFC
//! 3339 values with an offset (which
//! are normalized to UTC).

use chrono::{
  DateTime,
  NaiveDateTime
};

pub const WIRE_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 6] = [
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M"
];

pub fn parse(
  raw: &str
) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  if let Ok(dt) =
    DateTime::parse_from_rfc3339(raw)
  {
    return Some(dt.naive_utc());
  }

  NAIVE_FORMATS.iter().find_map(|fmt| {
    NaiveDateTime::parse_from_str(
      raw, fmt
    )
    .ok()
  })
}

pub fn format(
  dt: &NaiveDateTime
) -> String {
  dt.format(WIRE_FORMAT).to_string()
}

pub mod option {
  use chrono::NaiveDateTime;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    dt: &Option<NaiveDateTime>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match dt {
      | Some(value) => {
        serializer.serialize_str(
          &super::format(value)
        )
      }
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDateTime>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    match raw {
      | None => Ok(None),
      | Some(value)
        if value.trim().is_empty() =>
      {
        Ok(None)
      }
      | Some(value) => {
        super::parse(&value)
          .map(Some)
          .ok_or_else(|| {
            serde::de::Error::custom(
              format!(
                "unrecognized \
                 timestamp: {value}"
              )
            )
          })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn nine_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
      .and_then(|day| {
        day.and_hms_opt(9, 0, 0)
      })
      .expect("valid timestamp")
  }

  #[test]
  fn accepts_every_column_shape() {
    for raw in [
      "2024-01-01T09:00",
      "2024-01-01T09:00:00",
      "2024-01-01T09:00:00.000",
      "2024-01-01 09:00:00",
      "2024-01-01 09:00",
      "2024-01-01T09:00:00+00:00",
      "2024-01-01T10:00:00+01:00",
      "2024-01-01T09:00:00Z"
    ] {
      assert_eq!(
        parse(raw),
        Some(nine_am()),
        "{raw}"
      );
    }
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(parse("tomorrow"), None);
    assert_eq!(parse("2024-13-01T09:00"), None);
  }

  #[test]
  fn formats_with_seconds() {
    assert_eq!(
      format(&nine_am()),
      "2024-01-01T09:00:00"
    );
  }
}
