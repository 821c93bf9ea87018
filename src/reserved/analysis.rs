//! Reserved instance coverage analysis
//!
//! Drives grouping and matching over one fleet snapshot and assembles the
//! report. The computation is pure: the same records in the same order always
//! produce the same report.

use super::grouping::{group_instances, group_reservations, GroupedMultiset};
use super::matcher::match_reservation;
use super::types::{
    CoverageResult, GroupLabel, InstanceRecord, MatchKind, ReservationRecord, ReservationUnit,
};
use crate::error::Result;
use serde::Serialize;

/// Instances of one `(instance_type, zone, tenancy)` group and their verdicts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceItem {
    pub group: GroupLabel,
    pub instances: Vec<CoverageResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub instance_items: Vec<InstanceItem>,
    /// Reservation units no running instance used
    pub remaining_reservations: GroupedMultiset<ReservationUnit>,
    /// Every active reservation unit, before matching
    pub all_reservation_groups: GroupedMultiset<ReservationUnit>,
}

impl AnalysisReport {
    pub fn instance_count(&self) -> usize {
        self.instance_items.iter().map(|item| item.instances.len()).sum()
    }

    pub fn covered_count(&self) -> usize {
        self.coverage().filter(|c| c.is_covered()).count()
    }

    pub fn uncovered_count(&self) -> usize {
        self.instance_count() - self.covered_count()
    }

    pub fn matched_unit_count(&self) -> usize {
        self.all_reservation_groups.unit_count() - self.remaining_reservations.unit_count()
    }

    /// Sum of recurring reservation charges paid by covered instances
    pub fn covered_hourly_total(&self) -> f64 {
        self.coverage().map(|c| c.covered_hourly_charge).sum()
    }

    pub fn coverage(&self) -> impl Iterator<Item = &CoverageResult> {
        self.instance_items.iter().flat_map(|item| item.instances.iter())
    }
}

/// Match running instances against active reservations.
///
/// Every record is validated up front; the first malformed one fails the run.
/// Instance groups are visited by instance type, then group size, both
/// descending, with ties left in first-seen order. Within a group instances
/// are matched in input order.
pub fn analyze(
    instances: &[InstanceRecord],
    reservations: &[ReservationRecord],
) -> Result<AnalysisReport> {
    for record in instances {
        record.validate()?;
    }
    for record in reservations {
        record.validate()?;
    }

    let all_reservation_groups = group_reservations(reservations);
    let mut pool = group_reservations(reservations);

    let mut groups = group_instances(instances).into_groups();
    groups.sort_by(|(a_key, a_units), (b_key, b_units)| {
        (b_key.instance_type.as_str(), b_units.len())
            .cmp(&(a_key.instance_type.as_str(), a_units.len()))
    });

    let mut instance_items = Vec::with_capacity(groups.len());
    for (key, units) in groups {
        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            let matched = match_reservation(&mut pool, &key);
            let (covered_hourly_charge, reservation_id, match_kind) = match matched {
                Some(m) => (m.unit.hourly_charge.unwrap_or(0.0), Some(m.unit.reservation_id), m.kind),
                None => (0.0, None, MatchKind::Uncovered),
            };
            results.push(CoverageResult {
                account_id: unit.account_id,
                network_id: unit.network_id,
                instance_id: unit.instance_id,
                covered_hourly_charge,
                display_name: unit.display_name,
                reservation_id,
                match_kind,
            });
        }
        instance_items.push(InstanceItem {
            group: GroupLabel::from(&key),
            instances: results,
        });
    }

    Ok(AnalysisReport {
        instance_items,
        remaining_reservations: pool,
        all_reservation_groups,
    })
}
