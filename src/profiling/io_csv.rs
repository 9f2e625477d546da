// Primitives for reading and writing CSV files.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::profiling::*;

/// A table read from a file: the header and the data rows.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub header: Vec<String>,
    /// Each row with its line number in the file. The header is on line 1.
    pub rows: Vec<(usize, Vec<String>)>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name.trim())
    }

    pub fn require_column(&self, name: &str) -> ProfilingResult<usize> {
        self.column_index(name).context(MissingColumnSnafu {
            path: self.path.clone(),
            column: name,
        })
    }

    /// The first of the given names present in the header.
    pub fn find_column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.column_index(n))
    }
}

pub fn read_csv_table(path: &Path) -> PanelResult<RawTable> {
    let p = path.display().to_string();
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(UnreadableCsvSnafu { path: p.clone() })?;
    let mut records = rdr.into_records();
    let header: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(UnreadableCsvSnafu { path: p.clone() })?;
            line.iter()
                .enumerate()
                .map(|(idx, s)| {
                    let s = if idx == 0 {
                        s.trim_start_matches('\u{feff}')
                    } else {
                        s
                    };
                    s.trim().to_string()
                })
                .collect()
        }
        None => Vec::new(),
    };
    debug!("read_csv_table: {:?}: header {:?}", p, header);

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(UnreadableCsvSnafu { path: p.clone() })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_csv_table: {:?}: skipping blank line {}", p, lineno);
            continue;
        }
        rows.push((lineno, cells));
    }
    info!("read_csv_table: {:?}: {} rows", p, rows.len());
    Ok(RawTable {
        path: p,
        header,
        rows,
    })
}

/// Writes a CSV file in one step: the content goes to a temporary file of the
/// same directory, which then replaces `path`.
pub fn write_csv_atomic<H: AsRef<str>>(
    path: &Path,
    header: &[H],
    rows: &[Vec<String>],
) -> PanelResult<()> {
    let p = path.display().to_string();
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).context(WritingSnafu { path: p.clone() })?;
    let mut tmp = NamedTempFile::new_in(dir).context(WritingSnafu { path: p.clone() })?;
    {
        let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
        wtr.write_record(header.iter().map(|h| h.as_ref()))
            .context(WritingCsvSnafu { path: p.clone() })?;
        for row in rows.iter() {
            wtr.write_record(row)
                .context(WritingCsvSnafu { path: p.clone() })?;
        }
        wtr.flush().context(WritingSnafu { path: p.clone() })?;
    }
    tmp.flush().context(WritingSnafu { path: p.clone() })?;
    tmp.as_file()
        .sync_all()
        .context(WritingSnafu { path: p.clone() })?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .context(WritingSnafu { path: p })?;
    debug!("write_csv_atomic: {:?}: {} rows", path, rows.len());
    Ok(())
}
