//! Fleet collection
//!
//! A fleet is the flat list of instance records and reservation records gathered
//! from every configured account. Accounts are read one after another; a failure
//! in any account aborts the collection, since a report missing one account would
//! show that account's reservations as unused.

use crate::error::{ReservectlError, Result};
use crate::reserved::{analyze, AnalysisReport, InstanceRecord, ReservationRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Something that can list the instances and reservations of one account
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Identifier stamped on every record from this account
    fn account_id(&self) -> &str;

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>>;

    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>>;
}

/// Records gathered from all accounts, in collection order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub instances: Vec<InstanceRecord>,
    pub reservations: Vec<ReservationRecord>,
}

impl FleetSnapshot {
    /// Parse a snapshot, reporting missing or mistyped fields as input errors
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ReservectlError::InputShape {
            record: "fleet snapshot".to_string(),
            field: format!("line {} column {}", e.line(), e.column()),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn analyze(&self) -> Result<AnalysisReport> {
        analyze(&self.instances, &self.reservations)
    }
}

/// Read every account in order and concatenate their records
pub async fn collect_fleet(accounts: &[Box<dyn AccountSource>]) -> Result<FleetSnapshot> {
    let mut fleet = FleetSnapshot::default();
    for account in accounts {
        let reservations = account.list_reservations().await?;
        let instances = account.list_instances().await?;
        info!(
            "Account {}: {} instances, {} reservations",
            account.account_id(),
            instances.len(),
            reservations.len()
        );
        fleet.reservations.extend(reservations);
        fleet.instances.extend(instances);
    }
    Ok(fleet)
}

/// Collect from every account and run the coverage analysis
pub async fn analyze_accounts(accounts: &[Box<dyn AccountSource>]) -> Result<AnalysisReport> {
    collect_fleet(accounts).await?.analyze()
}
