//! Report rendering
//!
//! Text output groups instances the same way the analysis does, followed by
//! unused reservations and a short summary. JSON output wraps the raw report
//! with its summary and a timestamp.

use crate::pricing::{RegionPriceMapping, SizeRecord};
use crate::reserved::{AnalysisReport, MatchKind};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, Table};
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub instances: usize,
    pub covered: usize,
    pub uncovered: usize,
    pub reservation_units: usize,
    pub unused_reservation_units: usize,
    pub covered_hourly_total: f64,
}

impl From<&AnalysisReport> for ReportSummary {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            instances: report.instance_count(),
            covered: report.covered_count(),
            uncovered: report.uncovered_count(),
            reservation_units: report.all_reservation_groups.unit_count(),
            unused_reservation_units: report.remaining_reservations.unit_count(),
            covered_hourly_total: report.covered_hourly_total(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: ReportSummary,
    report: &'a AnalysisReport,
}

pub fn render_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at: Utc::now(),
        summary: ReportSummary::from(report),
        report,
    })
}

pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str("RESERVED INSTANCE COVERAGE\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));

    for item in &report.instance_items {
        let covered = item.instances.iter().filter(|c| c.is_covered()).count();
        out.push_str(&format!(
            "\n{} {} {} ({}/{} covered)\n",
            style(&item.group.instance_type).bold().cyan(),
            item.group.placement_zone,
            item.group.tenancy,
            covered,
            item.instances.len()
        ));

        let mut table = Table::new();
        table.set_header(vec!["Account", "Instance ID", "Name", "VPC", "Reservation", "Charge/hr"]);
        for result in &item.instances {
            let reservation_cell = match result.match_kind {
                MatchKind::Exact => Cell::new(result.reservation_id.as_deref().unwrap_or("-"))
                    .fg(Color::Green),
                MatchKind::IsolationFallback => Cell::new(format!(
                    "{} (other VPC scope)",
                    result.reservation_id.as_deref().unwrap_or("-")
                ))
                .fg(Color::Yellow),
                MatchKind::Uncovered => Cell::new("ON-DEMAND").fg(Color::Red),
            };
            table.add_row(vec![
                Cell::new(&result.account_id),
                Cell::new(&result.instance_id),
                Cell::new(result.display_name.as_deref().unwrap_or("-")),
                Cell::new(result.network_id.as_deref().unwrap_or("-")),
                reservation_cell,
                Cell::new(format!("${:.4}", result.covered_hourly_charge)),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    let unused: Vec<_> = report
        .remaining_reservations
        .iter()
        .filter(|(_, units)| !units.is_empty())
        .collect();
    if !unused.is_empty() {
        out.push_str(&format!("\n{}\n", style("UNUSED RESERVATIONS:").bold().yellow()));
        let mut table = Table::new();
        table.set_header(vec!["Type", "VPC", "Zone", "Tenancy", "Unused", "Purchased"]);
        for (key, units) in unused {
            table.add_row(vec![
                Cell::new(&key.instance_type),
                Cell::new(if key.in_network_isolation { "yes" } else { "no" }),
                Cell::new(&key.placement_zone),
                Cell::new(key.tenancy),
                Cell::new(units.len()),
                Cell::new(report.all_reservation_groups.get(key).len()),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    let summary = ReportSummary::from(report);
    out.push_str(&format!("\n{}\n", "-".repeat(80)));
    out.push_str(&format!(
        "{} {} running, {} covered, {} on-demand\n",
        style("Instances:").dim(),
        summary.instances,
        style(summary.covered).green(),
        style(summary.uncovered).red()
    ));
    out.push_str(&format!(
        "{} {} purchased, {} unused\n",
        style("Reservation units:").dim(),
        summary.reservation_units,
        style(summary.unused_reservation_units).yellow()
    ));
    out.push_str(&format!(
        "{} ${:.4}/hr\n",
        style("Covered recurring charges:").dim(),
        summary.covered_hourly_total
    ));
    out
}

/// Render one region of a price mapping, sizes in name order
pub fn render_prices(
    mapping: &RegionPriceMapping,
    region: Option<&str>,
    column: &str,
    currency: &str,
) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Region", "Size", "vCPU", "Memory (GiB)", "Price/hr"]);
    for (region_name, sizes) in mapping {
        if region.is_some_and(|r| r != region_name) {
            continue;
        }
        for (size_name, size) in sizes {
            table.add_row(vec![
                Cell::new(region_name),
                Cell::new(size_name),
                Cell::new(size.vcpu.as_deref().unwrap_or("-")),
                Cell::new(size.memory_gib.as_deref().unwrap_or("-")),
                price_cell(size, column, currency),
            ]);
        }
    }
    table.to_string()
}

fn price_cell(size: &SizeRecord, column: &str, currency: &str) -> Cell {
    match size.hourly_price(column, currency) {
        Some(price) => Cell::new(format!("{:.4} {}", price, currency)),
        None => Cell::new("N/A").fg(Color::DarkGrey),
    }
}
