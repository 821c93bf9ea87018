//! Matching of a single instance against the reservation pool

use super::grouping::GroupedMultiset;
use super::types::{BillingKey, MatchKind, ReservationUnit};

/// A reservation unit taken out of the pool for one instance
#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    pub unit: ReservationUnit,
    pub kind: MatchKind,
}

/// Take a reservation unit for an instance with the given billing key.
///
/// The exact key is tried first, then the same key with the VPC flag inverted:
/// VPC scope limits where capacity is reserved but not the rate that is billed.
/// Within a key the most recently pushed unit is taken. On `None` the pool is
/// left untouched.
pub fn match_reservation(
    pool: &mut GroupedMultiset<ReservationUnit>,
    key: &BillingKey,
) -> Option<Matched> {
    if let Some(unit) = pool.pop(key) {
        return Some(Matched {
            unit,
            kind: MatchKind::Exact,
        });
    }
    pool.pop(&key.flipped()).map(|unit| Matched {
        unit,
        kind: MatchKind::IsolationFallback,
    })
}
