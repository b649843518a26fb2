//! Ordered facility registry built from a parsed snapshot.
//!
//! Identity is taken from each record's `hostname`. Records without one are
//! unreachable and get dropped. When two records share a hostname the later
//! record wins but keeps the position of the first, matching how the monitor's
//! consumers have always keyed the snapshot.
//!
//! Keying by hostname is a known weak spot: two services on one host cannot be
//! told apart and a record that lost its hostname silently disappears.

use indexmap::IndexMap;
use tracing::trace;

use crate::envelope::FacilityRecord;
use crate::model::{Facility, FacilityId};

pub type Registry = IndexMap<FacilityId, Facility>;

pub fn build_registry(records: impl IntoIterator<Item = FacilityRecord>) -> Registry {
    let mut registry = Registry::new();

    for record in records {
        let Some(id) = record.hostname.clone() else {
            trace!(name = ?record.name, "dropping facility without hostname");
            continue;
        };

        let facility = record.into_facility(id.clone());
        if registry.insert(id.clone(), facility).is_some() {
            trace!(%id, "facility replaced by a later record with the same hostname");
        }
    }

    registry
}
