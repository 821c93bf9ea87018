//! reservectl library
//!
//! Reserved instance coverage analysis and on-demand pricing lookup.

pub mod aws;
pub mod config;
pub mod error;
pub mod fleet;
pub mod pricing;
pub mod report;
pub mod reserved;
pub mod retry;

// Re-export commonly used types
pub use error::{ReservectlError, Result};
pub use fleet::{AccountSource, FleetSnapshot};
pub use reserved::{analyze, AnalysisReport, CoverageResult, InstanceRecord, ReservationRecord};
