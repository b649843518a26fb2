//! Status codes and the loose coercion applied to them at the wire boundary.
//!
//! The monitor that writes snapshots is not consistent about types: a status
//! may arrive as `1`, `"1"`, `1.0` or even `true`. Every such representation is
//! normalized here, once, so the rest of the engine compares plain enum values.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Overall or per-probe status of a facility.
///
/// The numeric codes only matter on the wire. Precedence between codes is
/// decided by the evaluator's rules, never by comparing the numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusCode {
    #[default]
    Unknown,
    Fail,
    Good,
    Incomplete,
    DnsBad,
}

impl StatusCode {
    /// Wire value of this code
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => -1,
            Self::Fail => 0,
            Self::Good => 1,
            Self::Incomplete => 2,
            Self::DnsBad => 3,
        }
    }

    /// Strict lookup from a wire value
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::Unknown),
            0 => Some(Self::Fail),
            1 => Some(Self::Good),
            2 => Some(Self::Incomplete),
            3 => Some(Self::DnsBad),
            _ => None,
        }
    }

    /// Loose coercion from a float. Only integral values map to a code.
    pub fn from_float(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 {
            Self::from_code(value as i64).unwrap_or_default()
        } else {
            Self::Unknown
        }
    }

    /// Loose coercion from text such as `"1"`, `" 0 "` or `"1.0"`.
    ///
    /// Anything that does not read as a number is `Unknown`, which compares
    /// unequal to both `Good` and `Fail`.
    pub fn parse_loose(text: &str) -> Self {
        let text = text.trim();
        if let Ok(code) = text.parse::<i64>() {
            return Self::from_code(code).unwrap_or_default();
        }
        match text.parse::<f64>() {
            Ok(value) => Self::from_float(value),
            Err(_) => Self::Unknown,
        }
    }

    pub fn is_good(self) -> bool {
        self == Self::Good
    }

    pub fn is_fail(self) -> bool {
        self == Self::Fail
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Fail => "FAIL",
            Self::Good => "GOOD",
            Self::Incomplete => "INCOMPLETE",
            Self::DnsBad => "DNS_BAD",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LooseStatusVisitor)
    }
}

struct LooseStatusVisitor;

impl<'de> Visitor<'de> for LooseStatusVisitor {
    type Value = StatusCode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a status code as a number, numeric string or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<StatusCode, E> {
        Ok(if v { StatusCode::Good } else { StatusCode::Fail })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<StatusCode, E> {
        Ok(StatusCode::from_code(v).unwrap_or_default())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<StatusCode, E> {
        Ok(i64::try_from(v)
            .ok()
            .and_then(StatusCode::from_code)
            .unwrap_or_default())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<StatusCode, E> {
        Ok(StatusCode::from_float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<StatusCode, E> {
        Ok(StatusCode::parse_loose(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<StatusCode, E> {
        Ok(StatusCode::Unknown)
    }

    fn visit_none<E: de::Error>(self) -> Result<StatusCode, E> {
        Ok(StatusCode::Unknown)
    }

    // Structured values are not statuses; consume them and report Unknown.
    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<StatusCode, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(StatusCode::Unknown)
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<StatusCode, A::Error> {
        while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
        Ok(StatusCode::Unknown)
    }
}
