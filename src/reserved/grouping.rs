//! Grouping of instances and reservations by billing key

use super::types::{BillingKey, InstanceRecord, InstanceUnit, ReservationRecord, ReservationUnit};
use serde::{Serialize, Serializer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Multiset of units keyed by `BillingKey`.
///
/// Units keep the order they were pushed in, and keys keep the order they were
/// first seen in. Reading a key that was never pushed yields an empty slice.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMultiset<T> {
    keys: Vec<BillingKey>,
    groups: HashMap<BillingKey, Vec<T>>,
}

impl<T> Default for GroupedMultiset<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            groups: HashMap::new(),
        }
    }
}

impl<T> GroupedMultiset<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit to the end of its group
    pub fn push(&mut self, key: BillingKey, unit: T) {
        match self.groups.entry(key) {
            Entry::Occupied(entry) => entry.into_mut().push(unit),
            Entry::Vacant(entry) => {
                self.keys.push(entry.key().clone());
                entry.insert(vec![unit]);
            }
        }
    }

    /// Remove and return the most recently pushed unit under `key`
    pub fn pop(&mut self, key: &BillingKey) -> Option<T> {
        self.groups.get_mut(key)?.pop()
    }

    pub fn get(&self, key: &BillingKey) -> &[T] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in first-seen order, including groups that have been drained
    pub fn iter(&self) -> impl Iterator<Item = (&BillingKey, &[T])> {
        self.keys.iter().map(move |key| (key, self.get(key)))
    }

    pub fn into_groups(mut self) -> Vec<(BillingKey, Vec<T>)> {
        self.keys
            .into_iter()
            .map(|key| {
                let units = self.groups.remove(&key).unwrap_or_default();
                (key, units)
            })
            .collect()
    }

    pub fn group_count(&self) -> usize {
        self.keys.len()
    }

    pub fn unit_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }
}

#[derive(Serialize)]
struct GroupEntry<'a, T> {
    key: &'a BillingKey,
    units: &'a [T],
}

impl<T: Serialize> Serialize for GroupedMultiset<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(key, units)| GroupEntry { key, units }))
    }
}

/// Group running, non-spot instances by billing key
pub fn group_instances<'a, I>(records: I) -> GroupedMultiset<InstanceUnit>
where
    I: IntoIterator<Item = &'a InstanceRecord>,
{
    let mut groups = GroupedMultiset::new();
    for record in records {
        if !record.is_running() || record.is_spot() {
            continue;
        }
        groups.push(record.billing_key(), InstanceUnit::from(record));
    }
    groups
}

/// Group active reservations, one unit per reserved instance
pub fn group_reservations<'a, I>(records: I) -> GroupedMultiset<ReservationUnit>
where
    I: IntoIterator<Item = &'a ReservationRecord>,
{
    let mut groups = GroupedMultiset::new();
    for record in records {
        if !record.is_active() {
            continue;
        }
        let key = record.billing_key();
        for _ in 0..record.instance_count {
            groups.push(key.clone(), ReservationUnit::from(record));
        }
    }
    groups
}
