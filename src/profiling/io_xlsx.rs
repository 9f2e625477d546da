use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::profiling::io_csv::RawTable;
use crate::profiling::*;

/// Reads a worksheet as a table: the first row is the header.
///
/// Without a worksheet name, the workbook must contain a single worksheet.
pub fn read_xlsx_table(path: &Path, worksheet_name: Option<&str>) -> PanelResult<RawTable> {
    let p = path.display().to_string();
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(row) => row
            .iter()
            .map(|c| read_cell(c, &p, 1).map(|s| s.trim().to_string()))
            .collect::<PanelResult<Vec<String>>>()?,
        None => Vec::new(),
    };
    debug!("read_xlsx_table: {:?}: header {:?}", p, header);

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells = row
            .iter()
            .map(|c| read_cell(c, &p, lineno))
            .collect::<PanelResult<Vec<String>>>()?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push((lineno, cells));
    }
    info!("read_xlsx_table: {:?}: {} rows", p, rows.len());
    Ok(RawTable {
        path: p,
        header,
        rows,
    })
}

fn get_range(path: &Path, worksheet_name_o: Option<&str>) -> PanelResult<calamine::Range<DataType>> {
    let p = path.display().to_string();
    debug!("get_range: path: {:?} worksheet: {:?}", p, worksheet_name_o);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu { path: p.clone() })?
            .context(OpeningExcelSnafu { path: p })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(ProfilingError::EmptyExcel { path: p })),
            [(worksheet_name, wrange)] => {
                debug!("get_range: path: {:?} worksheet: {:?}", p, worksheet_name);
                Ok(wrange.clone())
            }
            _ => Err(Box::new(ProfilingError::AmbiguousWorksheet { path: p })),
        }
    }
}

// Renders a cell the way it would appear in a CSV export.
fn read_cell(cell: &DataType, path: &str, lineno: usize) -> PanelResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        _ => Err(Box::new(ProfilingError::ExcelWrongCellType {
            path: path.to_string(),
            lineno,
            content: format!("{:?}", cell),
        })),
    }
}
