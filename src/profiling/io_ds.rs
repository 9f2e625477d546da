// Reader for the pre-tabulated exports: one (label, count) file per question.

use std::path::PathBuf;

use crate::profiling::io_common::{cell_value, parse_count, require_file};
use crate::profiling::io_csv::read_csv_table;
use crate::profiling::*;

/// The (label, count) columns of each file, as exported by the panel.
pub const DEFAULT_COLUMNS: [(Dimension, &str, &str); 9] = [
    (Dimension::Gender, "Gender", "Count"),
    (Dimension::Age, "Age", "N"),
    (Dimension::PersonalIncome, "Personal Income", "Count"),
    (Dimension::HouseholdIncome, "Household income", "Count"),
    (Dimension::Occupation, "Occupation Category", "Count"),
    // The employment export reuses the count header of the region export.
    (Dimension::Employment, "Employment Status", "Region Area Count"),
    (Dimension::Region, "Region Area", "Region Area Count"),
    (Dimension::CarsAtHome, "Number of cars at home", "Count"),
    (Dimension::CarOwner, "Owner of car", "Count"),
];

pub fn file_name(panel: Panel, dimension: Dimension, month: Month) -> String {
    format!(
        "{}_{}_{}.csv",
        panel.file_prefix(),
        dimension.name(),
        month.code()
    )
}

fn column_names(input: &PanelInput, dimension: Dimension) -> (String, String) {
    let (label, count) = DEFAULT_COLUMNS
        .iter()
        .find(|(d, _, _)| *d == dimension)
        .map(|(_, l, c)| (l.to_string(), c.to_string()))
        .unwrap_or_else(|| (dimension.column_prefix().to_string(), "Count".to_string()));
    match input.column_names(dimension) {
        Some(names) => (
            names.label.clone().unwrap_or(label),
            names.count.clone().unwrap_or(count),
        ),
        None => (label, count),
    }
}

/// Reads the nine files of the month into weighted observations.
///
/// A blank count is read as 0. Every file must exist.
pub fn read_dimension_counts(
    input: &PanelInput,
    month: Month,
) -> PanelResult<Vec<(Dimension, Observation)>> {
    let mut res: Vec<(Dimension, Observation)> = Vec::new();
    for dimension in Dimension::ALL {
        let path: PathBuf = input
            .directory
            .join(file_name(input.panel, dimension, month));
        require_file(
            &path,
            &format!(
                "the {} export of panel {} for {} is expected here",
                dimension,
                input.panel,
                month.label()
            ),
        )?;
        let table = read_csv_table(&path)?;
        let (label_name, count_name) = column_names(input, dimension);
        let label_idx = table.require_column(&label_name)?;
        let count_idx = table.require_column(&count_name)?;

        let mut total: u64 = 0;
        for (lineno, row) in table.rows.iter() {
            let count = match cell_value(row, count_idx) {
                None => 0,
                Some(s) => match parse_count(&s) {
                    Some(c) => c,
                    None => {
                        return Err(Box::new(ProfilingError::BadCount {
                            path: table.path.clone(),
                            lineno: *lineno,
                            value: s,
                        }));
                    }
                },
            };
            let raw = cell_value(row, label_idx);
            debug!(
                "read_dimension_counts: {}: line {}: {:?} {}",
                dimension, lineno, raw, count
            );
            total = match total.checked_add(count) {
                Some(t) => t,
                None => {
                    return Err(Box::new(ProfilingError::BadCount {
                        path: table.path.clone(),
                        lineno: *lineno,
                        value: count.to_string(),
                    }));
                }
            };
            res.push((dimension, Observation { raw, count }));
        }
        info!(
            "read_dimension_counts: {}: {} rows, {} respondents",
            dimension,
            table.rows.len(),
            total
        );
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    fn june() -> Month {
        Month::new(2025, 6).unwrap()
    }

    fn input(dir: &Path) -> PanelInput {
        PanelInput {
            panel: Panel::Ds,
            provider: Provider::DsDimensionCounts,
            directory: dir.to_path_buf(),
            file_name: None,
            excel_worksheet_name: None,
            columns: BTreeMap::new(),
        }
    }

    fn write_all(dir: &Path) {
        for (d, label, count) in DEFAULT_COLUMNS.iter() {
            fs::write(
                dir.join(file_name(Panel::Ds, *d, june())),
                format!("{},{}\n", label, count),
            )
            .unwrap();
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(
            file_name(Panel::Ds, Dimension::CarOwner, june()),
            "ds_car_owner_202506.csv"
        );
        assert_eq!(
            file_name(Panel::Ds, Dimension::HouseholdIncome, june()),
            "ds_household_income_202506.csv"
        );
    }

    #[test]
    fn reads_counts() {
        let dir = tempfile::TempDir::new().unwrap();
        write_all(dir.path());
        fs::write(
            dir.path().join("ds_gender_202506.csv"),
            "Gender,Count\nMale,120\nFemale,130.0\n,\nOther,\n",
        )
        .unwrap();
        let obs = read_dimension_counts(&input(dir.path()), june()).unwrap();
        let gender: Vec<&Observation> = obs
            .iter()
            .filter(|(d, _)| *d == Dimension::Gender)
            .map(|(_, o)| o)
            .collect();
        assert_eq!(gender.len(), 3);
        assert_eq!(gender[0].raw.as_deref(), Some("Male"));
        assert_eq!(gender[1].count, 130);
        assert_eq!(gender[2].raw.as_deref(), Some("Other"));
        assert_eq!(gender[2].count, 0);
        assert_eq!(obs.len(), 3);
    }

    #[test]
    fn configured_columns() {
        let dir = tempfile::TempDir::new().unwrap();
        write_all(dir.path());
        fs::write(
            dir.path().join("ds_employment_202506.csv"),
            "Employment Status,Count\nRetired,4\n",
        )
        .unwrap();
        let mut i = input(dir.path());
        assert!(matches!(
            *read_dimension_counts(&i, june()).unwrap_err(),
            ProfilingError::MissingColumn { .. }
        ));
        i.columns.insert(
            Dimension::Employment,
            ColumnNames {
                label: None,
                count: Some("Count".to_string()),
            },
        );
        let obs = read_dimension_counts(&i, june()).unwrap();
        assert_eq!(
            obs,
            vec![(
                Dimension::Employment,
                Observation {
                    raw: Some("Retired".to_string()),
                    count: 4
                }
            )]
        );
    }

    #[test]
    fn bad_count_and_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        write_all(dir.path());
        fs::write(
            dir.path().join("ds_age_202506.csv"),
            "Age,N\n20-29,12\n30-39,many\n",
        )
        .unwrap();
        match *read_dimension_counts(&input(dir.path()), june()).unwrap_err() {
            ProfilingError::BadCount { lineno, value, .. } => {
                assert_eq!(lineno, 3);
                assert_eq!(value, "many");
            }
            e => panic!("unexpected error {:?}", e),
        }
        fs::write(
            dir.path().join("ds_age_202506.csv"),
            format!("Age,N\n20-29,{}\n30-39,1\n", u64::MAX),
        )
        .unwrap();
        match *read_dimension_counts(&input(dir.path()), june()).unwrap_err() {
            ProfilingError::BadCount { lineno, value, .. } => {
                assert_eq!(lineno, 3);
                assert_eq!(value, "1");
            }
            e => panic!("unexpected error {:?}", e),
        }
        fs::remove_file(dir.path().join("ds_region_202506.csv")).unwrap();
        fs::write(dir.path().join("ds_age_202506.csv"), "Age,N\n").unwrap();
        match *read_dimension_counts(&input(dir.path()), june()).unwrap_err() {
            ProfilingError::MissingInputFile { path, .. } => {
                assert!(path.ends_with("ds_region_202506.csv"))
            }
            e => panic!("unexpected error {:?}", e),
        }
    }
}
