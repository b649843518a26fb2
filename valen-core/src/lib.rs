pub mod config;
pub mod engine;
pub mod model;
pub mod source;
pub mod status;

// Snapshot ingestion
pub mod envelope;
pub mod legacy;
pub mod registry;

// Derived status
pub mod dns;
pub mod evaluator;

// Front-end helpers
pub mod display;

pub use engine::{Engine, LoadError, SnapshotFormat};
pub use model::{Facility, FacilityKind, Instance, Link, Report};
pub use status::StatusCode;
