//! Wire types for the JSON snapshot written by the monitor.
//!
//! Only `facilities` is structurally required. Everything else is optional and
//! read leniently: missing or null fields fall back to defaults, and a list
//! entry that cannot be read (a facility, link or instance) is dropped on its
//! own instead of rejecting the snapshot.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

use crate::model::{Facility, FacilityId, FacilityKind, Instance, Link};
use crate::status::StatusCode;

#[derive(Clone, Debug, Deserialize)]
pub struct Envelope {
    /// Unix seconds of the snapshot
    #[serde(default)]
    pub ts: Option<Value>,

    /// Refresh interval override in seconds
    #[serde(default)]
    pub refresh_interval: Option<Value>,

    #[serde(deserialize_with = "lenient_entries")]
    pub facilities: Vec<FacilityRecord>,
}

impl Envelope {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.ts.as_ref().and_then(loose_int)
    }

    /// The override, if it is a positive integer
    pub fn refresh_interval(&self) -> Option<u64> {
        self.refresh_interval
            .as_ref()
            .and_then(loose_int)
            .filter(|secs| *secs > 0)
            .map(|secs| secs as u64)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FacilityRecord {
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub desc: Option<String>,

    #[serde(default)]
    pub dns: StatusCode,

    #[serde(default)]
    pub status: Option<StatusCode>,

    #[serde(default, deserialize_with = "loose_bool")]
    pub hidden: bool,

    #[serde(default, deserialize_with = "lenient_list")]
    pub links: Vec<LinkRecord>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub instances: Vec<InstanceRecord>,

    #[serde(default, deserialize_with = "loose_float")]
    pub response_time: Option<f64>,
}

impl FacilityRecord {
    /// Convert to a probed facility keyed by `id`
    pub fn into_facility(self, id: FacilityId) -> Facility {
        Facility {
            name: self.name.unwrap_or_else(|| id.clone()),
            description: self.desc,
            hostname: self.hostname,
            dns: self.dns,
            status: self.status,
            instances: self.instances.into_iter().map(Instance::from).collect(),
            links: self.links.into_iter().map(Link::from).collect(),
            hidden: self.hidden,
            response_time: non_negative(self.response_time),
            kind: FacilityKind::Probed,
            id,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LinkRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub url: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: String,
}

impl From<LinkRecord> for Link {
    fn from(record: LinkRecord) -> Self {
        Link {
            url: record.url,
            title: record.title,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InstanceRecord {
    /// Numeric ids are accepted and kept as text
    #[serde(deserialize_with = "instance_id")]
    pub id: String,
    #[serde(default)]
    pub status: StatusCode,
    #[serde(default, deserialize_with = "loose_float")]
    pub response_time: Option<f64>,
}

impl From<InstanceRecord> for Instance {
    fn from(record: InstanceRecord) -> Self {
        Instance {
            id: record.id,
            status: record.status,
            response_time: non_negative(record.response_time),
        }
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Integer from a number or numeric string; fractional values are truncated
fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn loose_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Required array; entries that are not readable objects are skipped
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(readable_entries(Vec::<Value>::deserialize(deserializer)?))
}

/// Optional array; anything that is not an array reads as empty
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => readable_entries(items),
        _ => Vec::new(),
    })
}

fn readable_entries<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| {
            if !item.is_object() {
                trace!(entry = %item, "skipping entry that is not an object");
                return None;
            }
            serde_json::from_value(item)
                .map_err(|e| trace!(error = %e, "skipping unreadable entry"))
                .ok()
        })
        .collect()
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn instance_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("instance id must be text, got {}", other))),
    }
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Null => false,
    })
}
