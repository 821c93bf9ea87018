//! Conversion of EC2 API shapes into analysis records
//!
//! The SDK models every field as optional. Fields the analysis needs are
//! required here, and a missing one is reported as an input error naming the
//! record and field, rather than being defaulted.

use crate::error::{ReservectlError, Result};
use crate::reserved::{InstanceRecord, ReservationRecord, Tenancy};
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{Instance as Ec2Instance, ReservedInstances};

/// EC2 error codes that will not go away on retry
const NON_RETRYABLE_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "OptInRequired",
];

fn required<T>(value: Option<T>, record: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| ReservectlError::missing_field(record, field))
}

fn parse_tenancy(value: &str, record: &str, field: &str) -> Result<Tenancy> {
    value.parse().map_err(|reason| ReservectlError::InputShape {
        record: record.to_string(),
        field: field.to_string(),
        reason,
    })
}

/// Convert a DescribeInstances entry into an `InstanceRecord`
pub(crate) fn ec2_instance_to_record(
    instance: &Ec2Instance,
    account_id: &str,
) -> Result<InstanceRecord> {
    let instance_id = required(instance.instance_id(), "instance", "instance_id")?.to_string();
    let record = format!("instance {}", instance_id);

    let instance_type = required(instance.instance_type(), &record, "instance_type")?
        .as_str()
        .to_string();
    let placement = required(instance.placement(), &record, "placement")?;
    let placement_zone =
        required(placement.availability_zone(), &record, "placement.availability_zone")?
            .to_string();
    let tenancy = parse_tenancy(
        required(placement.tenancy(), &record, "placement.tenancy")?.as_str(),
        &record,
        "placement.tenancy",
    )?;
    let state = required(
        instance.state().and_then(|s| s.name()),
        &record,
        "state.name",
    )?
    .as_str()
    .to_string();

    let network_id = instance.vpc_id().map(str::to_string);
    let display_name = instance
        .tags()
        .iter()
        .find(|tag| tag.key() == Some("Name"))
        .and_then(|tag| tag.value())
        .map(str::to_string);

    Ok(InstanceRecord {
        instance_id,
        instance_type,
        in_network_isolation: network_id.is_some(),
        placement_zone,
        tenancy,
        account_id: account_id.to_string(),
        network_id,
        display_name,
        state,
        spot_request_id: instance.spot_instance_request_id().map(str::to_string),
    })
}

/// Convert a DescribeReservedInstances entry into a `ReservationRecord`
///
/// Regional reservations have no availability zone; they are keyed by
/// `region` instead, which never equals an instance's zone.
pub(crate) fn reserved_instances_to_record(
    reserved: &ReservedInstances,
    account_id: &str,
    region: Option<&str>,
) -> Result<ReservationRecord> {
    let reservation_id = required(
        reserved.reserved_instances_id(),
        "reservation",
        "reserved_instances_id",
    )?
    .to_string();
    let record = format!("reservation {}", reservation_id);

    let instance_type = required(reserved.instance_type(), &record, "instance_type")?
        .as_str()
        .to_string();
    let product_description =
        required(reserved.product_description(), &record, "product_description")?
            .as_str()
            .to_string();
    let placement_zone = required(
        reserved.availability_zone().or(region),
        &record,
        "availability_zone",
    )?
    .to_string();
    let tenancy = parse_tenancy(
        required(reserved.instance_tenancy(), &record, "instance_tenancy")?.as_str(),
        &record,
        "instance_tenancy",
    )?;
    let count = required(reserved.instance_count(), &record, "instance_count")?;
    let instance_count = u32::try_from(count).map_err(|_| ReservectlError::InputShape {
        record: record.clone(),
        field: "instance_count".to_string(),
        reason: format!("must be a positive count, got {}", count),
    })?;
    let state = required(reserved.state(), &record, "state")?
        .as_str()
        .to_string();

    Ok(ReservationRecord {
        reservation_id,
        instance_type,
        product_description,
        placement_zone,
        tenancy,
        account_id: account_id.to_string(),
        instance_count,
        hourly_charge: reserved
            .recurring_charges()
            .first()
            .and_then(|charge| charge.amount()),
        state,
    })
}

/// Map an SDK failure, keeping throttling and outages retryable
pub(crate) fn aws_error<E, R>(operation: &str, err: SdkError<E, R>) -> ReservectlError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = format!("Failed to {}: {}", operation, DisplayErrorContext(err));
    match code.as_deref() {
        Some(code) if NON_RETRYABLE_CODES.contains(&code) => ReservectlError::Aws(message),
        _ => ReservectlError::CloudProvider {
            provider: "aws".to_string(),
            message,
            source: None,
        },
    }
}
