//! EC2-backed account source

use crate::config::{AccountConfig, RetryConfig};
use crate::error::Result;
use crate::fleet::AccountSource;
use crate::reserved::{InstanceRecord, ReservationRecord};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use tracing::debug;

use super::helpers::{aws_error, ec2_instance_to_record, reserved_instances_to_record};

/// One AWS account, reached through a shared-config profile
pub struct Ec2Account {
    account_id: String,
    region: Option<String>,
    client: Ec2Client,
    max_attempts: u32,
}

impl Ec2Account {
    /// Resolve credentials and region for `account` and build an EC2 client
    pub async fn connect(account: &AccountConfig, retry: &RetryConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &account.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &account.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|r| r.to_string());
        debug!(
            "Connected account {} (region: {})",
            account.account_id(),
            region.as_deref().unwrap_or("unset")
        );

        Self {
            account_id: account.account_id(),
            region,
            client: Ec2Client::new(&sdk_config),
            max_attempts: retry.max_attempts,
        }
    }

    fn retry_policy(&self) -> ExponentialBackoffPolicy {
        ExponentialBackoffPolicy::new(self.max_attempts)
    }
}

#[async_trait]
impl AccountSource for Ec2Account {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        let policy = self.retry_policy();
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = policy
                .execute_with_retry(|| {
                    let token = next_token.clone();
                    async move {
                        self.client
                            .describe_instances()
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| aws_error("describe instances", e))
                    }
                })
                .await?;

            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    records.push(ec2_instance_to_record(instance, &self.account_id)?);
                }
            }

            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!("{}: described {} instances", self.account_id, records.len());
        Ok(records)
    }

    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>> {
        let response = self
            .retry_policy()
            .execute_with_retry(|| async {
                self.client
                    .describe_reserved_instances()
                    .send()
                    .await
                    .map_err(|e| aws_error("describe reserved instances", e))
            })
            .await?;

        let records = response
            .reserved_instances()
            .iter()
            .map(|ri| reserved_instances_to_record(ri, &self.account_id, self.region.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        debug!("{}: described {} reservations", self.account_id, records.len());
        Ok(records)
    }
}
