//! AWS account access
//!
//! Reads running instances and reserved instances from EC2 and converts them
//! into analysis records.
//!
//! ## Module Organization
//!
//! - `account`: `Ec2Account`, the `AccountSource` backed by the EC2 API
//! - `helpers`: SDK shape conversion and error mapping
//!
//! Every configured account gets its own client, built from its shared-config
//! profile and optional region override. Describe calls are retried with
//! exponential backoff; authorization failures are not.

mod account;
mod helpers;

pub use account::Ec2Account;

use crate::config::Config;
use crate::fleet::AccountSource;

/// Build an account source for every configured account
pub async fn connect_accounts(config: &Config) -> Vec<Box<dyn AccountSource>> {
    let mut accounts: Vec<Box<dyn AccountSource>> = Vec::with_capacity(config.accounts.len());
    for account in &config.accounts {
        accounts.push(Box::new(Ec2Account::connect(account, &config.retry).await));
    }
    accounts
}
