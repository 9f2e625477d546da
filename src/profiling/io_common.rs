use std::path::Path;

use crate::profiling::*;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Fails with a message telling how to produce the file when it does not exist.
pub fn require_file(path: &Path, hint: &str) -> ProfilingResult<()> {
    ensure!(
        path.is_file(),
        MissingInputFileSnafu {
            path: path.display().to_string(),
            hint
        }
    );
    Ok(())
}

/// Parses a count cell.
///
/// Integral floats such as `12.0` are accepted, as written by spreadsheet tools.
pub fn parse_count(s: &str) -> Option<u64> {
    let t = s.trim();
    if let Ok(x) = t.parse::<u64>() {
        return Some(x);
    }
    match t.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 9.0e15 => Some(f as u64),
        _ => None,
    }
}

/// The value of a cell, `None` when it is blank.
pub fn cell_value(row: &[String], idx: usize) -> Option<String> {
    row.get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn make_default_id(path: &Path) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count(" 12.0 "), Some(12));
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("NaN"), None);
        assert_eq!(parse_count("twelve"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn file_names() {
        assert_eq!(
            simplify_file_name(Path::new("/data/ms_data/ms_data_202506.csv")),
            "ms_data_202506.csv"
        );
        let id = make_default_id(Path::new("a/b.csv"));
        assert_eq!(id(3), "b.csv-00000003");
    }

    #[test]
    fn missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("nothing.csv");
        match require_file(&p, "run the process step first") {
            Err(ProfilingError::MissingInputFile { path, hint }) => {
                assert!(path.ends_with("nothing.csv"));
                assert_eq!(hint, "run the process step first");
            }
            x => panic!("unexpected result {:?}", x),
        }
        std::fs::write(&p, "").unwrap();
        assert!(require_file(&p, "").is_ok());
    }

    #[test]
    fn cells() {
        let row = vec!["a".to_string(), "  ".to_string()];
        assert_eq!(cell_value(&row, 0), Some("a".to_string()));
        assert_eq!(cell_value(&row, 1), None);
        assert_eq!(cell_value(&row, 2), None);
    }
}
