//! Subscriber records and their validation at the wire boundary.
//!
//! The service hands out loosely-shaped JSON objects. Everything past this
//! module works on [`SubscriberRecord`], which is only constructed through
//! [`SubscriberRecord::try_from`] or [`parse_list`].

use std::{collections::HashSet, convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ─── Identity ─────────────────────────────────────────────────────────────────

/// Opaque subscriber identity. The service issues numeric ids, but string ids
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubscriberId {
  Numeric(i64),
  Text(String),
}

impl SubscriberId {
  /// Whether two ids name the same subscriber, regardless of how the wire
  /// encoded them (`2` and `"2"` are the same id).
  pub fn same_as(&self, other: &SubscriberId) -> bool {
    self == other || self.to_string() == other.to_string()
  }
}

impl fmt::Display for SubscriberId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SubscriberId::Numeric(n) => write!(f, "{n}"),
      SubscriberId::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for SubscriberId {
  fn from(value: i64) -> Self {
    SubscriberId::Numeric(value)
  }
}

impl From<&str> for SubscriberId {
  fn from(value: &str) -> Self {
    SubscriberId::Text(value.to_owned())
  }
}

impl FromStr for SubscriberId {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Ok(match s.parse::<i64>() {
      Ok(n) => SubscriberId::Numeric(n),
      Err(_) => SubscriberId::Text(s.to_owned()),
    })
  }
}

// ─── Wire shape ───────────────────────────────────────────────────────────────

/// A subscriber object exactly as the service sends it. Every field is
/// optional here; validation happens in [`SubscriberRecord::try_from`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSubscriber {
  pub id:         Option<SubscriberId>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub name:       Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub created_at: Option<Value>,
}

// ─── Record ───────────────────────────────────────────────────────────────────

/// A validated subscriber. Never mutated after construction; a refresh
/// replaces records wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRecord {
  pub id:         SubscriberId,
  pub first_name: String,
  pub last_name:  String,
  /// Full name as supplied by the service. Not assumed to equal
  /// `first_name + " " + last_name`.
  pub name:       Option<String>,
  pub email:      String,
  pub phone:      Option<String>,
  /// Creation timestamp text as received.
  pub created_at: Option<String>,
}

impl SubscriberRecord {
  /// The service-supplied full name, or `"first last"` when it is absent.
  pub fn display_name(&self) -> String {
    match self.name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.to_owned(),
      _ => format!("{} {}", self.first_name, self.last_name)
        .trim()
        .to_owned(),
    }
  }

  /// Calendar date of creation, if the timestamp is present and parseable.
  pub fn created_date(&self) -> Option<NaiveDate> {
    self.created_at.as_deref().and_then(parse_created_at)
  }
}

impl TryFrom<WireSubscriber> for SubscriberRecord {
  type Error = Error;

  fn try_from(wire: WireSubscriber) -> Result<Self> {
    let id = wire
      .id
      .ok_or_else(|| Error::InvalidRecord("missing id".into()))?;
    let required = |field: Option<String>, label: &str| {
      field.ok_or_else(|| Error::InvalidRecord(format!("subscriber {id}: missing {label}")))
    };

    Ok(Self {
      first_name: required(wire.first_name, "firstName")?,
      last_name: required(wire.last_name, "lastName")?,
      email: required(wire.email, "email")?,
      name: wire.name,
      phone: wire.phone,
      created_at: wire.created_at.and_then(created_at_text),
      id,
    })
  }
}

/// Validate a full list response. Any invalid object, or two objects sharing
/// an id, rejects the whole list.
pub fn parse_list(wire: Vec<WireSubscriber>) -> Result<Vec<SubscriberRecord>> {
  let mut seen = HashSet::with_capacity(wire.len());
  let mut records = Vec::with_capacity(wire.len());
  for item in wire {
    let record = SubscriberRecord::try_from(item)?;
    if !seen.insert(record.id.to_string()) {
      return Err(Error::InvalidRecord(format!(
        "duplicate id {} in subscriber list",
        record.id
      )));
    }
    records.push(record);
  }
  Ok(records)
}

// ─── Timestamps ───────────────────────────────────────────────────────────────

/// Normalise the wire `createdAt` into text. Strings pass through; a
/// `[year, month, day, hour, minute, second, ...]` array is rendered as a
/// local date-time. Anything else is treated as absent.
fn created_at_text(value: Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s),
    Value::Array(parts) if parts.len() >= 3 => {
      let mut nums = parts.iter().map(Value::as_i64);
      let mut next = || nums.next().flatten();
      let (year, month, day) = (next()?, next()?, next()?);
      let (hour, minute, second) = (
        next().unwrap_or(0),
        next().unwrap_or(0),
        next().unwrap_or(0),
      );
      Some(format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
      ))
    }
    _ => None,
  }
}

const LOCAL_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
];

/// Parse a creation timestamp down to its calendar date.
///
/// Accepts RFC 3339, an offset-less local date-time, or a bare date. For
/// RFC 3339 the date is taken as written; the offset is not applied.
pub fn parse_created_at(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.date_naive());
  }
  LOCAL_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|dt| dt.date())
    .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

// ─── New subscriber ───────────────────────────────────────────────────────────

/// Body of `POST /subscribers/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscriber {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
}

impl NewSubscriber {
  /// Trim every field and reject obviously unusable input before it is sent.
  pub fn parse(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
  ) -> Result<Self> {
    let first_name = first_name.trim();
    let last_name = last_name.trim();
    let email = email.trim();

    if first_name.is_empty() {
      return Err(Error::InvalidSubscriber("first name is empty".into()));
    }
    if last_name.is_empty() {
      return Err(Error::InvalidSubscriber("last name is empty".into()));
    }
    match email.split_once('@') {
      Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
      _ => {
        return Err(Error::InvalidSubscriber(format!(
          "{email:?} is not an email address"
        )));
      }
    }

    Ok(Self {
      first_name: first_name.to_owned(),
      last_name:  last_name.to_owned(),
      email:      email.to_owned(),
      phone:      phone.trim().to_owned(),
    })
  }
}
