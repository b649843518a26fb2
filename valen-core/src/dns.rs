//! Synthetic facility summarizing name resolution across the report.

use tracing::debug;

use crate::model::{DNS_FACILITY_ID, Facility, FacilityId, FacilityKind};
use crate::registry::Registry;
use crate::status::StatusCode;

pub const DNS_FACILITY_NAME: &str = "Domain Name System";
pub const DNS_FACILITY_DESCRIPTION: &str =
    "Resolves names such as \u{201c}wesnoth.org\u{201d} to IP addresses";

/// Aggregate DNS verdict over a set of probed facilities
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsSummary {
    pub status: StatusCode,
    pub broken: Vec<FacilityId>,
}

/// `Fail` when nothing resolves, `Incomplete` when some names are broken,
/// `Good` otherwise. No facilities at all counts as nothing resolving.
pub fn summarize<'a>(facilities: impl IntoIterator<Item = &'a Facility>) -> DnsSummary {
    let mut good = 0usize;
    let mut broken = Vec::new();

    for facility in facilities.into_iter().filter(|f| !f.is_synthetic()) {
        if facility.dns.is_good() {
            good += 1;
        } else {
            broken.push(facility.id.clone());
        }
    }

    let status = if good == 0 {
        StatusCode::Fail
    } else if !broken.is_empty() {
        StatusCode::Incomplete
    } else {
        StatusCode::Good
    };

    DnsSummary { status, broken }
}

impl DnsSummary {
    /// The summary as a facility the general evaluator can score.
    ///
    /// Its own `dns` field mirrors the aggregate: `Good` only when every name
    /// resolves, `DnsBad` otherwise.
    pub fn into_facility(self) -> Facility {
        Facility {
            id: DNS_FACILITY_ID.to_string(),
            name: DNS_FACILITY_NAME.to_string(),
            description: Some(DNS_FACILITY_DESCRIPTION.to_string()),
            hostname: None,
            dns: if self.status.is_good() {
                StatusCode::Good
            } else {
                StatusCode::DnsBad
            },
            status: Some(self.status),
            instances: Vec::new(),
            links: Vec::new(),
            hidden: false,
            response_time: None,
            kind: FacilityKind::DnsSummary {
                broken_dns_hostnames: self.broken,
            },
        }
    }
}

/// Prepend the DNS summary to `registry`.
///
/// A probed facility whose hostname is literally `DNS` is replaced by the
/// summary.
pub fn synthesize(registry: &mut Registry) {
    let summary = summarize(registry.values());
    debug!(
        status = %summary.status,
        broken = summary.broken.len(),
        "synthesized DNS facility"
    );
    registry.shift_insert(0, DNS_FACILITY_ID.to_string(), summary.into_facility());
}
