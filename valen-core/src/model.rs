use indexmap::IndexMap;
use serde::Serialize;

use crate::evaluator;
use crate::status::StatusCode;

pub type FacilityId = String;
pub type InstanceId = String;

/// Identifier of the synthetic name-resolution facility
pub const DNS_FACILITY_ID: &str = "DNS";

/// Refresh interval used when neither the snapshot nor the config set one
pub const DEFAULT_REFRESH_INTERVAL: u64 = 900;

/// One probed endpoint belonging to a facility
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Instance {
    pub id: InstanceId,
    pub status: StatusCode,
    /// Last response time in milliseconds
    pub response_time: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub title: String,
}

/// Where a facility came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacilityKind {
    /// Read directly from the snapshot
    Probed,
    /// Derived from the DNS health of every probed facility
    DnsSummary { broken_dns_hostnames: Vec<FacilityId> },
}

/// One monitored service
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Facility {
    pub id: FacilityId,
    /// Display name (falls back to the id)
    pub name: String,
    pub description: Option<String>,
    pub hostname: Option<String>,
    pub dns: StatusCode,
    /// Direct probe result, if the monitor probed the facility as a whole
    pub status: Option<StatusCode>,
    pub instances: Vec<Instance>,
    pub links: Vec<Link>,
    /// Kept in the report but skipped by presentation
    pub hidden: bool,
    /// Last response time in milliseconds
    pub response_time: Option<f64>,
    #[serde(flatten)]
    pub kind: FacilityKind,
}

impl Facility {
    /// A probed facility with only its identity filled in
    pub fn probed(id: impl Into<FacilityId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            hostname: Some(id.clone()),
            id,
            description: None,
            dns: StatusCode::Unknown,
            status: None,
            instances: Vec::new(),
            links: Vec::new(),
            hidden: false,
            response_time: None,
            kind: FacilityKind::Probed,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        !matches!(self.kind, FacilityKind::Probed)
    }

    /// Hostnames with broken name resolution (only set on the DNS summary)
    pub fn broken_dns_hostnames(&self) -> &[FacilityId] {
        match &self.kind {
            FacilityKind::DnsSummary {
                broken_dns_hostnames,
            } => broken_dns_hostnames,
            FacilityKind::Probed => &[],
        }
    }

    pub fn overall(&self) -> StatusCode {
        evaluator::overall(self)
    }
}

/// A whole snapshot, normalized.
///
/// Facilities are kept in presentation order; the DNS summary, when present,
/// is always first. A missing `timestamp` means no usable report was loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub facilities: IndexMap<FacilityId, Facility>,
    pub timestamp: Option<i64>,
    pub refresh_interval: u64,
    pub site_notice: Option<String>,
}

impl Default for Report {
    fn default() -> Self {
        Self::empty(DEFAULT_REFRESH_INTERVAL)
    }
}

impl Report {
    /// An unavailable report with the given refresh interval
    pub fn empty(refresh_interval: u64) -> Self {
        Self {
            facilities: IndexMap::new(),
            timestamp: None,
            refresh_interval,
            site_notice: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.timestamp.is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Facility> {
        self.facilities.get(id)
    }

    /// Overall status of a facility by id; `Unknown` if there is no such facility
    pub fn overall(&self, id: &str) -> StatusCode {
        evaluator::overall_by_id(self, id)
    }

    /// Facilities presentation should show, in order
    pub fn visible(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.values().filter(|f| !f.hidden)
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
