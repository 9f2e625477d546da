// Reading and writing the summary table and the intermediate files.

use std::path::Path;

use crate::profiling::io_common::{parse_count, simplify_file_name};
use crate::profiling::io_csv::{read_csv_table, write_csv_atomic, RawTable};
use crate::profiling::*;

fn malformed(table: &RawTable, lineno: usize, reason: String) -> Box<ProfilingError> {
    Box::new(ProfilingError::MalformedSummary {
        path: table.path.clone(),
        lineno,
        reason,
    })
}

// Reads every row of a file in the summary layout.
fn read_rows(path: &Path) -> PanelResult<(RawTable, Vec<(usize, SummaryRow)>)> {
    let table = read_csv_table(path)?;
    let panel_idx = table
        .column_index(schema::PANEL_COLUMN)
        .ok_or_else(|| malformed(&table, 1, format!("missing column {}", schema::PANEL_COLUMN)))?;
    let month_idx = table
        .column_index(schema::MONTH_COLUMN)
        .ok_or_else(|| malformed(&table, 1, format!("missing column {}", schema::MONTH_COLUMN)))?;

    let mut count_idxs: Vec<(usize, &'static str)> = Vec::new();
    for (idx, name) in table.header.iter().enumerate() {
        if idx == panel_idx || idx == month_idx {
            continue;
        }
        match schema::count_columns().iter().find(|c| **c == name.as_str()) {
            Some(c) => count_idxs.push((idx, *c)),
            None => warn!(
                "read_rows: {}: ignoring unknown column {:?}",
                simplify_file_name(path),
                name
            ),
        }
    }
    let missing: Vec<&str> = schema::count_columns()
        .iter()
        .filter(|c| !count_idxs.iter().any(|(_, n)| n == *c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        warn!(
            "read_rows: {}: {} count columns missing, read as 0: {:?}",
            simplify_file_name(path),
            missing.len(),
            missing
        );
    }

    let mut rows: Vec<(usize, SummaryRow)> = Vec::new();
    for (lineno, cells) in table.rows.iter() {
        let cell = |idx: usize| cells.get(idx).map(|s| s.trim()).unwrap_or("");
        let panel = Panel::parse(cell(panel_idx))
            .map_err(|e| malformed(&table, *lineno, e.to_string()))?;
        let month = Month::parse(cell(month_idx))
            .map_err(|e| malformed(&table, *lineno, e.to_string()))?;
        let mut row = SummaryRow::zeroed(panel, month);
        for (idx, name) in count_idxs.iter() {
            let s = cell(*idx);
            // Blank cells are zero counts.
            if s.is_empty() {
                continue;
            }
            let value = parse_count(s).ok_or_else(|| {
                malformed(&table, *lineno, format!("invalid count {:?} in column {}", s, name))
            })?;
            row.set(name, value);
        }
        debug!("read_rows: line {}: {:?}", lineno, row.key());
        rows.push((*lineno, row));
    }
    Ok((table, rows))
}

/// Reads the cumulative summary table.
///
/// Any problem makes the whole file invalid: nothing is returned from a partly
/// readable summary.
pub fn read_summary(path: &Path) -> PanelResult<SummaryTable> {
    let (table, rows) = read_rows(path)?;
    let mut seen: Vec<(Panel, Month)> = Vec::new();
    for (lineno, row) in rows.iter() {
        if seen.contains(&row.key()) {
            return Err(malformed(
                &table,
                *lineno,
                format!("duplicate row for panel {} and month {}", row.panel, row.month),
            ));
        }
        seen.push(row.key());
    }
    let res = SummaryTable::from_rows(rows.into_iter().map(|(_, r)| r).collect())
        .context(ProfileSnafu {})?;
    info!(
        "read_summary: {}: {} rows",
        simplify_file_name(path),
        res.len()
    );
    Ok(res)
}

/// Reads the row written by the process step of a panel.
pub fn read_intermediate(path: &Path, panel: Panel, month: Month) -> PanelResult<SummaryRow> {
    let (table, mut rows) = read_rows(path)?;
    match rows.len() {
        1 => {
            let (lineno, row) = rows.remove(0);
            if row.key() != (panel, month) {
                return Err(malformed(
                    &table,
                    lineno,
                    format!(
                        "expected the row of panel {} for {}, found panel {} for {}",
                        panel, month, row.panel, row.month
                    ),
                ));
            }
            Ok(row)
        }
        n => Err(malformed(&table, 1, format!("expected 1 row, found {}", n))),
    }
}

/// Writes rows in the summary layout, replacing the file.
pub fn write_rows(path: &Path, rows: &[SummaryRow]) -> PanelResult<()> {
    let cells: Vec<Vec<String>> = rows.iter().map(|r| r.cells()).collect();
    write_csv_atomic(path, schema::columns(), &cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn month(m: u32) -> Month {
        Month::new(2025, m).unwrap()
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("summary.csv");
        let mut a = SummaryRow::zeroed(Panel::Ds, month(5));
        a.set("Total_Respondents_Count", 10);
        a.set("Car_Owner_Dont_Know_Count", 4);
        let b = SummaryRow::zeroed(Panel::Ms, month(5));
        write_rows(&p, &[a.clone(), b.clone()]).unwrap();

        let content = fs::read_to_string(&p).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("DS,2025-05-01,10,0,"));
        assert!(lines[1].ends_with(",4"));

        let t = read_summary(&p).unwrap();
        assert_eq!(t.rows(), &[a, b]);
    }

    #[test]
    fn lenient_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("summary.csv");
        fs::write(
            &p,
            "Collected_Month,Panel_Source,Total_Respondents_Count,Gender_Male_Count,Silver_Gen_Count\n\
             2025-04-01 00:00:00,MS,12.0,,7\n",
        )
        .unwrap();
        let t = read_summary(&p).unwrap();
        let r = t.get(Panel::Ms, month(4)).unwrap();
        assert_eq!(r.total(), 12);
        assert_eq!(r.get("Gender_Male_Count"), Some(0));
        assert_eq!(r.get("Region_West_Count"), Some(0));
    }

    #[test]
    fn malformed_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("summary.csv");
        let cases = [
            ("Total_Respondents_Count\n3\n", 1),
            ("Panel_Source,Collected_Month\nMS,June\n", 2),
            (
                "Panel_Source,Collected_Month,Total_Respondents_Count\nMS,2025-06-01,1\nDS,2025-06-01,-4\n",
                3,
            ),
            (
                "Panel_Source,Collected_Month,Total_Respondents_Count\nMS,2025-06-01,1\nms,2025-06-01,2\n",
                3,
            ),
        ];
        for (content, expected) in cases.iter() {
            fs::write(&p, content).unwrap();
            match *read_summary(&p).unwrap_err() {
                ProfilingError::MalformedSummary { lineno, .. } => {
                    assert_eq!(lineno, *expected, "{}", content)
                }
                e => panic!("unexpected error {:?}", e),
            }
        }
    }

    #[test]
    fn intermediate_key_is_checked() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("temp_ms_data_202506.csv");
        write_rows(&p, &[SummaryRow::zeroed(Panel::Ms, month(5))]).unwrap();
        assert!(read_intermediate(&p, Panel::Ms, month(5)).is_ok());
        assert!(read_intermediate(&p, Panel::Ms, month(6)).is_err());
        assert!(read_intermediate(&p, Panel::Ds, month(5)).is_err());
        write_rows(&p, &[]).unwrap();
        assert!(read_intermediate(&p, Panel::Ms, month(5)).is_err());
    }
}
