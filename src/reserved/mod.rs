//! Reserved instance coverage
//!
//! Reconciles running instances against active reservations.
//!
//! ## Module Organization
//!
//! - `types`: input records, billing keys, per-instance verdicts
//! - `grouping`: `GroupedMultiset` and the instance/reservation grouping rules
//! - `matcher`: takes one reservation unit for one instance
//! - `analysis`: runs a whole fleet through grouping and matching
//!
//! Nothing here performs I/O or logs. Records arrive already collected
//! (see `crate::fleet`) and the report is rendered elsewhere (see `crate::report`).

pub mod analysis;
pub mod grouping;
pub mod matcher;
pub mod types;

pub use analysis::{analyze, AnalysisReport, InstanceItem};
pub use grouping::{group_instances, group_reservations, GroupedMultiset};
pub use matcher::{match_reservation, Matched};
pub use types::{
    BillingKey, CoverageResult, GroupLabel, InstanceRecord, InstanceUnit, MatchKind,
    ReservationRecord, ReservationUnit, Tenancy,
};
