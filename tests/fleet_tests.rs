//! Multi-account collection with in-memory account sources

use async_trait::async_trait;
use reservectl::fleet::{analyze_accounts, collect_fleet, AccountSource, FleetSnapshot};
use reservectl::reserved::{InstanceRecord, ReservationRecord, Tenancy};
use reservectl::{ReservectlError, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct StaticAccount {
    id: String,
    instances: Vec<InstanceRecord>,
    reservations: Vec<ReservationRecord>,
    fail_instances: bool,
    calls: Arc<AtomicU32>,
}

impl StaticAccount {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            instances: Vec::new(),
            reservations: Vec::new(),
            fail_instances: false,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn with_instance(mut self, instance_id: &str, instance_type: &str) -> Self {
        self.instances.push(InstanceRecord {
            instance_id: instance_id.to_string(),
            instance_type: instance_type.to_string(),
            in_network_isolation: true,
            placement_zone: "us-east-1a".to_string(),
            tenancy: Tenancy::Shared,
            account_id: self.id.clone(),
            network_id: Some(format!("vpc-{}", self.id)),
            display_name: None,
            state: "running".to_string(),
            spot_request_id: None,
        });
        self
    }

    fn with_reservation(mut self, reservation_id: &str, instance_type: &str, count: u32) -> Self {
        self.reservations.push(ReservationRecord {
            reservation_id: reservation_id.to_string(),
            instance_type: instance_type.to_string(),
            product_description: "Linux/UNIX (Amazon VPC)".to_string(),
            placement_zone: "us-east-1a".to_string(),
            tenancy: Tenancy::Shared,
            account_id: self.id.clone(),
            instance_count: count,
            hourly_charge: Some(0.05),
            state: "active".to_string(),
        });
        self
    }

    fn failing(mut self) -> Self {
        self.fail_instances = true;
        self
    }
}

#[async_trait]
impl AccountSource for StaticAccount {
    fn account_id(&self) -> &str {
        &self.id
    }

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_instances {
            return Err(ReservectlError::Aws(format!(
                "Failed to describe instances: UnauthorizedOperation ({})",
                self.id
            )));
        }
        Ok(self.instances.clone())
    }

    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reservations.clone())
    }
}

#[tokio::test]
async fn test_collect_keeps_account_order() {
    let accounts: Vec<Box<dyn AccountSource>> = vec![
        Box::new(
            StaticAccount::new("prod")
                .with_instance("i-prod", "m4.large")
                .with_reservation("ri-prod", "m4.large", 1),
        ),
        Box::new(
            StaticAccount::new("staging")
                .with_instance("i-staging-1", "m4.large")
                .with_instance("i-staging-2", "c5.large"),
        ),
    ];

    let fleet = collect_fleet(&accounts).await.unwrap();

    let ids: Vec<_> = fleet.instances.iter().map(|i| i.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["i-prod", "i-staging-1", "i-staging-2"]);
    assert_eq!(fleet.reservations.len(), 1);
    assert_eq!(fleet.reservations[0].account_id, "prod");
}

#[tokio::test]
async fn test_reservations_shared_across_accounts() {
    let accounts: Vec<Box<dyn AccountSource>> = vec![
        Box::new(StaticAccount::new("billing").with_reservation("ri-1", "m4.large", 2)),
        Box::new(
            StaticAccount::new("prod")
                .with_instance("i-1", "m4.large")
                .with_instance("i-2", "m4.large")
                .with_instance("i-3", "m4.large"),
        ),
    ];

    let report = analyze_accounts(&accounts).await.unwrap();

    assert_eq!(report.instance_count(), 3);
    assert_eq!(report.covered_count(), 2);
    assert_eq!(report.remaining_reservations.unit_count(), 0);
    assert!(report.coverage().all(|c| c.account_id == "prod"));
}

#[tokio::test]
async fn test_account_failure_aborts_collection() {
    let healthy = StaticAccount::new("prod").with_instance("i-1", "m4.large");
    let accounts: Vec<Box<dyn AccountSource>> = vec![
        Box::new(StaticAccount::new("locked").failing()),
        Box::new(healthy),
    ];

    let err = collect_fleet(&accounts).await.unwrap_err();

    assert!(matches!(err, ReservectlError::Aws(_)));
    assert!(err.to_string().contains("locked"));
}

#[tokio::test]
async fn test_later_accounts_not_queried_after_failure() {
    let locked = StaticAccount::new("locked").failing();
    let prod = StaticAccount::new("prod").with_instance("i-1", "m4.large");
    let locked_calls = Arc::clone(&locked.calls);
    let prod_calls = Arc::clone(&prod.calls);
    let accounts: Vec<Box<dyn AccountSource>> = vec![Box::new(locked), Box::new(prod)];

    assert!(collect_fleet(&accounts).await.is_err());

    assert_eq!(locked_calls.load(Ordering::SeqCst), 2);
    assert_eq!(prod_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_snapshot_round_trip_gives_same_report() {
    let accounts: Vec<Box<dyn AccountSource>> = vec![Box::new(
        StaticAccount::new("prod")
            .with_instance("i-1", "m4.large")
            .with_reservation("ri-1", "m4.large", 1),
    )];
    let fleet = collect_fleet(&accounts).await.unwrap();

    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("fleet.json");
    fleet.save(&path).unwrap();
    let loaded = FleetSnapshot::load(&path).unwrap();

    assert_eq!(loaded, fleet);
    assert_eq!(loaded.analyze().unwrap(), fleet.analyze().unwrap());
}
