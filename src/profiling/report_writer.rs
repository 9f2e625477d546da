use std::path::{Path, PathBuf};

use panel_profile::report::{
    combined, highlights, panel_snapshot, shares, DerivedMetrics, Distribution, Filter, Metric,
    MonthlyComparison, Scope, Selection,
};

use crate::profiling::io_csv::write_csv_atomic;
use crate::profiling::*;

fn scope_file_prefix(scope: Scope) -> &'static str {
    match scope {
        Scope::Panel(Panel::Ms) => "meow",
        Scope::Panel(Panel::Ds) => "asian",
        Scope::Combined => "combined",
    }
}

// The panel names shown in the exported tables.
fn panel_label(panel: Panel) -> &'static str {
    match panel {
        Panel::Ms => "Meow",
        Panel::Ds => "Asian panel",
    }
}

pub fn comparison_file_name(comparison: &MonthlyComparison) -> String {
    format!(
        "{}_monthly_trends_{}.csv",
        scope_file_prefix(comparison.scope),
        comparison.year
    )
}

/// One row per metric, one column per month of the year.
pub fn write_monthly_comparison(
    out_dir: &Path,
    comparison: &MonthlyComparison,
) -> PanelResult<PathBuf> {
    let mut header: Vec<String> = vec!["Metric".to_string()];
    header.extend(comparison.months.iter().map(|m| m.label()));
    let rows: Vec<Vec<String>> = comparison
        .rows
        .iter()
        .map(|(metric, cells)| {
            let mut r = vec![metric.label().to_string()];
            r.extend(cells.iter().map(|c| c.render()));
            r
        })
        .collect();
    let path = out_dir.join(comparison_file_name(comparison));
    write_csv_atomic(&path, &header, &rows)?;
    info!(
        "write_monthly_comparison: {} {} written to {:?}",
        comparison.scope.label(),
        comparison.year,
        path
    );
    Ok(path)
}

pub fn filtered_file_name(filter: &Filter) -> String {
    let panel = panel_code(filter.panel);
    let month = filter
        .month
        .map(|m| m.date().format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| "All".to_string());
    format!("analytics_data_{}_{}.csv", panel, month)
}

/// The derived metrics of every row matching the filter.
pub fn write_filtered_metrics(
    out_dir: &Path,
    table: &SummaryTable,
    filter: &Filter,
) -> PanelResult<PathBuf> {
    let mut header: Vec<&str> = vec!["Panel Source", "Month"];
    header.extend(Metric::ALL.iter().map(|m| m.label()));
    let rows: Vec<Vec<String>> = filter
        .matching(table)
        .iter()
        .map(|r| {
            let dm = DerivedMetrics::of(r);
            let mut cells = vec![
                panel_label(r.panel).to_string(),
                r.month.date().format("%d-%m-%Y").to_string(),
            ];
            cells.extend(Metric::ALL.iter().map(|m| dm.get(*m).to_string()));
            cells
        })
        .collect();
    let path = out_dir.join(filtered_file_name(filter));
    write_csv_atomic(&path, &header, &rows)?;
    info!(
        "write_filtered_metrics: {} rows written to {:?}",
        rows.len(),
        path
    );
    Ok(path)
}

fn panel_code(panel: Option<Panel>) -> String {
    panel
        .map(|p| p.to_string())
        .unwrap_or_else(|| "All".to_string())
}

pub fn distribution_file_name(dimension: Dimension, panel: Option<Panel>, month: Month) -> String {
    format!(
        "distribution_{}_{}_{}.csv",
        dimension.name(),
        panel_code(panel),
        month.date().format("%d-%m-%Y")
    )
}

/// One row per category, with the count and the share of each panel and of all
/// the panels together. Shares are computed over the categories shown.
pub fn write_distribution(
    out_dir: &Path,
    distribution: &Distribution,
    panel: Option<Panel>,
    month: Month,
) -> PanelResult<PathBuf> {
    let mut header: Vec<String> = vec!["Category".to_string()];
    let mut columns: Vec<(Vec<u64>, Vec<f64>)> = Vec::new();
    for (p, counts) in distribution.panels.iter() {
        header.push(panel_label(*p).to_string());
        header.push(format!("{} %", panel_label(*p)));
        columns.push((counts.clone(), shares(counts)));
    }
    header.push("Total".to_string());
    header.push("Total %".to_string());
    columns.push((distribution.totals.clone(), shares(&distribution.totals)));

    let rows: Vec<Vec<String>> = distribution
        .categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut r = vec![c.label().to_string()];
            for (counts, pcts) in columns.iter() {
                r.push(counts[i].to_string());
                r.push(format!("{:.1}", pcts[i]));
            }
            r
        })
        .collect();
    let path = out_dir.join(distribution_file_name(distribution.dimension, panel, month));
    write_csv_atomic(&path, &header, &rows)?;
    debug!(
        "write_distribution: {}: {} categories written to {:?}",
        distribution.dimension,
        rows.len(),
        path
    );
    Ok(path)
}

fn render_metrics(name: &str, dm: &DerivedMetrics) -> String {
    let values: Vec<String> = Metric::ALL
        .iter()
        .map(|m| format!("{} {}", m.label(), report::format_count(dm.get(*m))))
        .collect();
    format!("{:<12} {}", name, values.join(" | "))
}

/// A short text summary of the selected month.
pub fn render_overview(selection: &Selection) -> String {
    let month = match selection.month {
        Some(m) => m,
        None => return "No data".to_string(),
    };
    let mut lines: Vec<String> = vec![format!("Month: {}", month.label())];
    for panel in Panel::ALL {
        if let Some(dm) = panel_snapshot(selection, panel) {
            lines.push(render_metrics(panel.display_name(), &dm));
        }
    }
    match combined(selection) {
        Some(dm) => lines.push(render_metrics("Combined", &dm)),
        None => {
            lines.push("No data".to_string());
            return lines.join("\n");
        }
    }
    let h = highlights(selection);
    lines.push(format!(
        "Car ownership {:.1}% ({} households with cars, {} without)",
        h.car_ownership_rate,
        report::format_count(h.households_with_cars),
        report::format_count(h.no_car_households)
    ));
    lines.push(format!(
        "{:.1} women per 100 men, silver gen {:.1}%, age 20-29 {:.1}%",
        h.female_male_ratio, h.silver_gen_rate, h.young_adult_rate
    ));
    lines.push(format!(
        "Bangkok {:.1}%, upcountry {:.1}%",
        h.bangkok_rate, h.upc_rate
    ));
    lines.join("\n")
}
