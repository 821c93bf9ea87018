//! On-demand pricing tables
//!
//! AWS publishes on-demand prices as JavaScript rather than JSON: the payload is
//! wrapped in a `callback(...)` call and object keys are bare identifiers. This
//! module repairs that text into JSON and re-indexes it by region and size.
//!
//! Fetching is independent of the reservation analysis; nothing here feeds the
//! matcher.

use crate::config::PricingConfig;
use crate::error::{ReservectlError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

const CALLBACK_PREFIX: &str = "callback(";
const CALLBACK_SUFFIX: &str = ");";

static BARE_KEY: OnceLock<Regex> = OnceLock::new();

fn bare_key() -> &'static Regex {
    BARE_KEY.get_or_init(|| Regex::new(r"(\w+?):").expect("bare key pattern is valid"))
}

/// region -> instance size -> size record
pub type RegionPriceMapping = BTreeMap<String, BTreeMap<String, SizeRecord>>;

/// Which published table to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Current,
    PreviousGeneration,
}

impl PriceSource {
    pub fn url<'a>(&self, config: &'a PricingConfig) -> &'a str {
        match self {
            PriceSource::Current => &config.on_demand_url,
            PriceSource::PreviousGeneration => &config.previous_generation_url,
        }
    }
}

/// One instance size entry of the pricing document
///
/// Descriptive fields are read as text whether the document gives a string or
/// a number. Keys not named here are kept in `extra` and written back out
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub size: String,
    #[serde(
        rename = "vCPU",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub vcpu: Option<String>,
    #[serde(
        rename = "ECU",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub ecu: Option<String>,
    #[serde(
        rename = "memoryGiB",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub memory_gib: Option<String>,
    #[serde(
        rename = "storageGB",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_gb: Option<String>,
    #[serde(rename = "valueColumns", default)]
    pub value_columns: Vec<ValueColumn>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueColumn {
    pub name: String,
    #[serde(default)]
    pub prices: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

impl SizeRecord {
    /// Hourly price in `currency` for the `column` operating system (e.g. `linux`).
    ///
    /// Returns `None` when the column is absent or the price is not a number
    /// (the document uses `N/A` for sizes not sold in a region).
    pub fn hourly_price(&self, column: &str, currency: &str) -> Option<f64> {
        self.value_columns
            .iter()
            .find(|c| c.name == column)
            .and_then(|c| c.prices.get(currency))
            .and_then(|price| match price {
                Value::String(text) => text.parse::<f64>().ok(),
                Value::Number(number) => number.as_f64(),
                _ => None,
            })
    }
}

#[derive(Deserialize)]
struct PriceTable {
    config: PriceTableConfig,
}

#[derive(Deserialize)]
struct PriceTableConfig {
    regions: Vec<RegionTable>,
}

#[derive(Deserialize)]
struct RegionTable {
    region: String,
    #[serde(rename = "instanceTypes")]
    instance_types: Vec<TypeCategory>,
}

#[derive(Deserialize)]
struct TypeCategory {
    sizes: Vec<SizeRecord>,
}

/// HTTP client for pricing downloads
pub fn build_client(config: &PricingConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Download and parse a pricing document
pub async fn fetch_price_table(client: &reqwest::Client, url: &str) -> Result<Value> {
    info!("Fetching price table: {}", url);
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!("Price document is {} bytes", body.len());
    parse_price_document(&body)
}

/// Strip the callback wrapper, quote bare keys and parse as JSON
pub fn parse_price_document(content: &str) -> Result<Value> {
    let start = content
        .find(CALLBACK_PREFIX)
        .ok_or_else(|| ReservectlError::Format(format!("'{}' not found", CALLBACK_PREFIX)))?
        + CALLBACK_PREFIX.len();
    let end = content
        .rfind(CALLBACK_SUFFIX)
        .filter(|&end| end >= start)
        .ok_or_else(|| ReservectlError::Format(format!("'{}' not found", CALLBACK_SUFFIX)))?;

    let repaired = bare_key().replace_all(&content[start..end], "\"${1}\":");

    serde_json::from_str(&repaired)
        .map_err(|e| ReservectlError::Format(format!("repaired document is not JSON: {}", e)))
}

/// Flatten `config.regions[].instanceTypes[].sizes[]` into region -> size.
///
/// A size listed twice in one region keeps the last entry.
pub fn price_table_to_region_mapping(table: &Value) -> Result<RegionPriceMapping> {
    let table = PriceTable::deserialize(table)
        .map_err(|e| ReservectlError::Format(format!("unexpected price table layout: {}", e)))?;

    let mut mapping = RegionPriceMapping::new();
    for region_table in table.config.regions {
        let mut sizes = BTreeMap::new();
        for category in region_table.instance_types {
            for size in category.sizes {
                sizes.insert(size.size.clone(), size);
            }
        }
        mapping.insert(region_table.region, sizes);
    }
    Ok(mapping)
}
