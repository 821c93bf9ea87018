//! Record and result types for reserved instance analysis
//!
//! Input records are plain value snapshots. They are validated once at the
//! boundary (`validate()`) so the grouping and matching code can assume every
//! required field is present and well-formed.

use crate::error::{ReservectlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime state an instance must be in to be considered
pub const RUNNING_STATE: &str = "running";

/// State a reservation must be in to be considered
pub const ACTIVE_STATE: &str = "active";

/// Marker in a reservation's product description for VPC scope
const VPC_MARKER: &str = "VPC";

/// Placement tenancy. EC2 calls shared tenancy `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenancy {
    #[serde(alias = "default")]
    Shared,
    Dedicated,
    Host,
}

impl Tenancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tenancy::Shared => "shared",
            Tenancy::Dedicated => "dedicated",
            Tenancy::Host => "host",
        }
    }
}

impl fmt::Display for Tenancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenancy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" | "shared" => Ok(Tenancy::Shared),
            "dedicated" => Ok(Tenancy::Dedicated),
            "host" => Ok(Tenancy::Host),
            other => Err(format!("unknown tenancy '{}'", other)),
        }
    }
}

/// The attributes that decide whether a reservation can pay for an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingKey {
    pub instance_type: String,
    pub in_network_isolation: bool,
    pub placement_zone: String,
    pub tenancy: Tenancy,
}

impl BillingKey {
    pub fn new(
        instance_type: impl Into<String>,
        in_network_isolation: bool,
        placement_zone: impl Into<String>,
        tenancy: Tenancy,
    ) -> Self {
        Self {
            instance_type: instance_type.into(),
            in_network_isolation,
            placement_zone: placement_zone.into(),
            tenancy,
        }
    }

    /// Same key with the VPC flag inverted
    pub fn flipped(&self) -> Self {
        Self {
            in_network_isolation: !self.in_network_isolation,
            ..self.clone()
        }
    }
}

impl fmt::Display for BillingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.instance_type,
            if self.in_network_isolation { "vpc" } else { "classic" },
            self.placement_zone,
            self.tenancy
        )
    }
}

/// One compute instance as reported by an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub instance_type: String,
    pub in_network_isolation: bool,
    pub placement_zone: String,
    pub tenancy: Tenancy,
    pub account_id: String,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub state: String,
    /// Set when the instance was launched from a spot request
    #[serde(default)]
    pub spot_request_id: Option<String>,
}

impl InstanceRecord {
    pub fn billing_key(&self) -> BillingKey {
        BillingKey::new(
            self.instance_type.clone(),
            self.in_network_isolation,
            self.placement_zone.clone(),
            self.tenancy,
        )
    }

    pub fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }

    pub fn is_spot(&self) -> bool {
        self.spot_request_id.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        let record = format!("instance {}", self.instance_id);
        require_non_empty("instance", "instance_id", &self.instance_id)?;
        require_non_empty(&record, "instance_type", &self.instance_type)?;
        require_non_empty(&record, "placement_zone", &self.placement_zone)?;
        require_non_empty(&record, "account_id", &self.account_id)?;
        require_non_empty(&record, "state", &self.state)?;
        Ok(())
    }
}

/// One reservation purchase. `instance_count` units share the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub reservation_id: String,
    pub instance_type: String,
    pub product_description: String,
    pub placement_zone: String,
    pub tenancy: Tenancy,
    pub account_id: String,
    pub instance_count: u32,
    #[serde(default)]
    pub hourly_charge: Option<f64>,
    pub state: String,
}

impl ReservationRecord {
    /// Whether the reservation was bought for VPC instances
    pub fn covers_network_isolation(&self) -> bool {
        self.product_description.contains(VPC_MARKER)
    }

    pub fn billing_key(&self) -> BillingKey {
        BillingKey::new(
            self.instance_type.clone(),
            self.covers_network_isolation(),
            self.placement_zone.clone(),
            self.tenancy,
        )
    }

    pub fn is_active(&self) -> bool {
        self.state == ACTIVE_STATE
    }

    pub fn validate(&self) -> Result<()> {
        let record = format!("reservation {}", self.reservation_id);
        require_non_empty("reservation", "reservation_id", &self.reservation_id)?;
        require_non_empty(&record, "instance_type", &self.instance_type)?;
        require_non_empty(&record, "placement_zone", &self.placement_zone)?;
        require_non_empty(&record, "account_id", &self.account_id)?;
        require_non_empty(&record, "state", &self.state)?;
        if self.instance_count == 0 {
            return Err(ReservectlError::InputShape {
                record,
                field: "instance_count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(charge) = self.hourly_charge {
            if !charge.is_finite() || charge < 0.0 {
                return Err(ReservectlError::InputShape {
                    record,
                    field: "hourly_charge".to_string(),
                    reason: format!("must be a non-negative amount, got {}", charge),
                });
            }
        }
        Ok(())
    }
}

fn require_non_empty(record: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReservectlError::InputShape {
            record: record.to_string(),
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// A running instance waiting for a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceUnit {
    pub account_id: String,
    pub network_id: Option<String>,
    pub instance_id: String,
    pub display_name: Option<String>,
}

impl From<&InstanceRecord> for InstanceUnit {
    fn from(record: &InstanceRecord) -> Self {
        Self {
            account_id: record.account_id.clone(),
            network_id: record.network_id.clone(),
            instance_id: record.instance_id.clone(),
            display_name: record.display_name.clone(),
        }
    }
}

/// One matchable slot of a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationUnit {
    pub account_id: String,
    pub reservation_id: String,
    pub hourly_charge: Option<f64>,
}

impl From<&ReservationRecord> for ReservationUnit {
    fn from(record: &ReservationRecord) -> Self {
        Self {
            account_id: record.account_id.clone(),
            reservation_id: record.reservation_id.clone(),
            hourly_charge: record.hourly_charge,
        }
    }
}

/// How an instance ended up covered (or not)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    IsolationFallback,
    Uncovered,
}

/// Coverage verdict for a single instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub account_id: String,
    pub network_id: Option<String>,
    pub instance_id: String,
    /// Recurring charge of the matched unit. Zero when nothing matched, and also
    /// when the matched reservation carries no recurring charge.
    pub covered_hourly_charge: f64,
    pub display_name: Option<String>,
    pub reservation_id: Option<String>,
    pub match_kind: MatchKind,
}

impl CoverageResult {
    pub fn is_covered(&self) -> bool {
        self.match_kind != MatchKind::Uncovered
    }
}

/// `(instance_type, zone, tenancy)` heading of an instance group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabel {
    pub instance_type: String,
    pub placement_zone: String,
    pub tenancy: Tenancy,
}

impl From<&BillingKey> for GroupLabel {
    fn from(key: &BillingKey) -> Self {
        Self {
            instance_type: key.instance_type.clone(),
            placement_zone: key.placement_zone.clone(),
            tenancy: key.tenancy,
        }
    }
}
