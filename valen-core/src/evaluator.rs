//! Overall status of a facility.
//!
//! Rules run in a fixed order and each may override the one before:
//!
//! 1. start from `Good`
//! 2. a name that does not resolve gives `DnsBad`
//! 3. a failed direct probe gives `Fail`
//! 4. with instances: none healthy gives `Fail`; some failing gives
//!    `Incomplete`, but only if nothing above has already downgraded the result
//!
//! The same rules score the DNS summary facility, whose `dns` field is set up so
//! they produce the right answer.

use crate::model::{Facility, Report};
use crate::status::StatusCode;

pub fn overall(facility: &Facility) -> StatusCode {
    let mut status = StatusCode::Good;

    if !facility.dns.is_good() {
        status = StatusCode::DnsBad;
    }

    if facility.status.is_some_and(StatusCode::is_fail) {
        status = StatusCode::Fail;
    }

    if !facility.instances.is_empty() {
        let any_good = facility.instances.iter().any(|i| i.status.is_good());
        let any_fail = facility.instances.iter().any(|i| i.status.is_fail());

        if !any_good {
            status = StatusCode::Fail;
        } else if any_fail && status == StatusCode::Good {
            status = StatusCode::Incomplete;
        }
    }

    status
}

/// `Unknown` when `id` is not in the report
pub fn overall_by_id(report: &Report, id: &str) -> StatusCode {
    report
        .get(id)
        .map(overall)
        .unwrap_or(StatusCode::Unknown)
}
