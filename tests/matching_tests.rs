//! Coverage matching scenarios
//!
//! Exercises grouping, matching and the full analysis through the public API.

use reservectl::reserved::{
    analyze, group_instances, group_reservations, match_reservation, BillingKey, InstanceRecord,
    MatchKind, ReservationRecord, Tenancy,
};
use reservectl::ReservectlError;

fn instance(id: &str, itype: &str, vpc: bool) -> InstanceRecord {
    InstanceRecord {
        instance_id: id.to_string(),
        instance_type: itype.to_string(),
        in_network_isolation: vpc,
        placement_zone: "us-east-1a".to_string(),
        tenancy: Tenancy::Shared,
        account_id: "prod".to_string(),
        network_id: vpc.then(|| "vpc-1".to_string()),
        display_name: None,
        state: "running".to_string(),
        spot_request_id: None,
    }
}

fn reservation(id: &str, itype: &str, description: &str, count: u32, charge: Option<f64>) -> ReservationRecord {
    ReservationRecord {
        reservation_id: id.to_string(),
        instance_type: itype.to_string(),
        product_description: description.to_string(),
        placement_zone: "us-east-1a".to_string(),
        tenancy: Tenancy::Shared,
        account_id: "prod".to_string(),
        instance_count: count,
        hourly_charge: charge,
        state: "active".to_string(),
    }
}

fn m4_key(vpc: bool) -> BillingKey {
    BillingKey::new("m4.large", vpc, "us-east-1a", Tenancy::Shared)
}

#[test]
fn test_two_instances_one_reservation() {
    let instances = vec![instance("i-1", "m4.large", false), instance("i-2", "m4.large", false)];
    let reservations = vec![reservation("ri-1", "m4.large", "Linux/UNIX", 1, Some(0.05))];

    let report = analyze(&instances, &reservations).unwrap();

    assert_eq!(report.instance_items.len(), 1);
    let results = &report.instance_items[0].instances;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].instance_id, "i-1");
    assert_eq!(results[0].covered_hourly_charge, 0.05);
    assert_eq!(results[0].reservation_id.as_deref(), Some("ri-1"));
    assert_eq!(results[1].instance_id, "i-2");
    assert_eq!(results[1].covered_hourly_charge, 0.0);
    assert_eq!(results[1].match_kind, MatchKind::Uncovered);

    assert!(report.remaining_reservations.get(&m4_key(false)).is_empty());
    assert_eq!(report.all_reservation_groups.get(&m4_key(false)).len(), 1);
}

#[test]
fn test_isolated_instance_falls_back_to_classic_reservation() {
    let instances = vec![instance("i-vpc", "m4.large", true)];
    let reservations = vec![reservation("ri-classic", "m4.large", "Linux/UNIX", 1, Some(0.05))];

    let report = analyze(&instances, &reservations).unwrap();
    let result = &report.instance_items[0].instances[0];

    assert!(result.is_covered());
    assert_eq!(result.match_kind, MatchKind::IsolationFallback);
    assert_eq!(result.reservation_id.as_deref(), Some("ri-classic"));
    assert_eq!(result.network_id.as_deref(), Some("vpc-1"));
}

#[test]
fn test_exact_match_preferred_over_fallback() {
    let instances = vec![instance("i-vpc", "m4.large", true)];
    let reservations = vec![
        reservation("ri-classic", "m4.large", "Linux/UNIX", 1, Some(0.04)),
        reservation("ri-vpc", "m4.large", "Linux/UNIX (Amazon VPC)", 1, Some(0.05)),
    ];

    let report = analyze(&instances, &reservations).unwrap();
    let result = &report.instance_items[0].instances[0];

    assert_eq!(result.match_kind, MatchKind::Exact);
    assert_eq!(result.reservation_id.as_deref(), Some("ri-vpc"));
    assert_eq!(report.remaining_reservations.get(&m4_key(false)).len(), 1);
}

#[test]
fn test_pool_consumed_last_in_first_out() {
    let reservations = vec![
        reservation("ri-1", "m4.large", "Linux/UNIX", 1, None),
        reservation("ri-2", "m4.large", "Linux/UNIX", 1, None),
    ];
    let mut pool = group_reservations(&reservations);

    let first = match_reservation(&mut pool, &m4_key(false)).unwrap();
    let second = match_reservation(&mut pool, &m4_key(false)).unwrap();

    assert_eq!(first.unit.reservation_id, "ri-2");
    assert_eq!(second.unit.reservation_id, "ri-1");
    assert!(match_reservation(&mut pool, &m4_key(false)).is_none());
}

#[test]
fn test_larger_type_name_and_group_sorted_first() {
    let mut instances: Vec<_> = (0..3).map(|i| instance(&format!("a-{}", i), "a", false)).collect();
    instances.extend((0..5).map(|i| instance(&format!("b-{}", i), "b", false)));

    let report = analyze(&instances, &[]).unwrap();

    let types: Vec<_> = report
        .instance_items
        .iter()
        .map(|item| item.group.instance_type.as_str())
        .collect();
    assert_eq!(types, vec!["b", "a"]);
    let ids: Vec<_> = report.instance_items[1]
        .instances
        .iter()
        .map(|r| r.instance_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a-0", "a-1", "a-2"]);
}

#[test]
fn test_same_type_sorted_by_group_size() {
    let mut small = instance("i-small", "m4.large", false);
    small.placement_zone = "us-east-1b".to_string();
    let instances = vec![
        small,
        instance("i-big-1", "m4.large", false),
        instance("i-big-2", "m4.large", false),
    ];

    let report = analyze(&instances, &[]).unwrap();

    assert_eq!(report.instance_items[0].group.placement_zone, "us-east-1a");
    assert_eq!(report.instance_items[1].group.placement_zone, "us-east-1b");
}

#[test]
fn test_missing_charge_reported_as_zero() {
    let instances = vec![instance("i-1", "m4.large", false)];
    let reservations = vec![reservation("ri-1", "m4.large", "Linux/UNIX", 1, None)];

    let report = analyze(&instances, &reservations).unwrap();
    let result = &report.instance_items[0].instances[0];

    assert!(result.is_covered());
    assert_eq!(result.covered_hourly_charge, 0.0);
}

#[test]
fn test_spot_and_stopped_instances_excluded() {
    let mut spot = instance("i-spot", "m4.large", false);
    spot.spot_request_id = Some("sir-1".to_string());
    let mut stopped = instance("i-stopped", "m4.large", false);
    stopped.state = "stopped".to_string();
    let instances = vec![spot, stopped, instance("i-1", "m4.large", false)];

    let report = analyze(&instances, &[]).unwrap();

    assert_eq!(report.instance_count(), 1);
    assert_eq!(group_instances(&instances).unit_count(), 1);
}

#[test]
fn test_retired_reservations_ignored() {
    let mut retired = reservation("ri-old", "m4.large", "Linux/UNIX", 4, Some(0.05));
    retired.state = "retired".to_string();
    let instances = vec![instance("i-1", "m4.large", false)];

    let report = analyze(&instances, &[retired]).unwrap();

    assert_eq!(report.covered_count(), 0);
    assert!(report.all_reservation_groups.is_empty());
}

#[test]
fn test_malformed_record_fails_whole_run() {
    let mut broken = instance("i-2", "m4.large", false);
    broken.placement_zone = String::new();
    let instances = vec![instance("i-1", "m4.large", false), broken];

    let result = analyze(&instances, &[]);

    assert!(matches!(result, Err(ReservectlError::InputShape { .. })));
}

#[test]
fn test_reservations_do_not_cross_tenancy() {
    let mut dedicated = instance("i-ded", "m4.large", false);
    dedicated.tenancy = Tenancy::Dedicated;
    let reservations = vec![reservation("ri-1", "m4.large", "Linux/UNIX", 1, Some(0.05))];

    let report = analyze(&[dedicated], &reservations).unwrap();

    assert_eq!(report.uncovered_count(), 1);
    assert_eq!(report.remaining_reservations.unit_count(), 1);
}
