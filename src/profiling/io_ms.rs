// Reader for the per-respondent exports, in CSV or Excel format.

use std::path::{Path, PathBuf};

use crate::profiling::io_common::{cell_value, make_default_id, require_file};
use crate::profiling::io_csv::{read_csv_table, RawTable};
use crate::profiling::io_xlsx::read_xlsx_table;
use crate::profiling::*;

/// The question column of each dimension, followed by the names it is known
/// under once renamed.
pub const QUESTION_COLUMNS: [(Dimension, &str, &str); 9] = [
    (Dimension::Age, "Q1_Age", "Age"),
    (Dimension::Gender, "Q2_Gender", "Gender"),
    (Dimension::PersonalIncome, "Q3_Personal_Income", "Personal_Income"),
    (Dimension::HouseholdIncome, "Q4_Household_Income", "Household_Income"),
    (Dimension::Occupation, "Q5_Occupation", "Occupation"),
    (Dimension::Employment, "Q6_Employment", "Employment_Status"),
    (Dimension::Region, "Q7_Province", "Province"),
    (Dimension::CarsAtHome, "Q8_Car_Num", "Number_of_Cars_at_Home"),
    (Dimension::CarOwner, "Q9_Car_Owner", "Owner_of_Car"),
];

pub const ID_COLUMNS: [&str; 2] = ["Resp ID", "Respondent_ID"];

/// The export of the month: the configured file name, or the first of
/// `<prefix>_data_<YYYYMM>.csv` and `<prefix>_data_<YYYYMM>.xlsx` that exists.
pub fn data_path(input: &PanelInput, month: Month) -> PathBuf {
    if let Some(name) = &input.file_name {
        return input.directory.join(name);
    }
    let stem = format!("{}_data_{}", input.panel.file_prefix(), month.code());
    let xlsx = input.directory.join(format!("{}.xlsx", stem));
    let csv = input.directory.join(format!("{}.csv", stem));
    if !csv.is_file() && xlsx.is_file() {
        xlsx
    } else {
        csv
    }
}

fn is_excel(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            e == "xlsx" || e == "xlsm"
        })
        .unwrap_or(false)
}

fn question_index(table: &RawTable, input: &PanelInput, dimension: Dimension) -> PanelResult<usize> {
    if let Some(label) = input.column_names(dimension).and_then(|c| c.label.clone()) {
        return Ok(table.require_column(&label)?);
    }
    let (_, question, alias) = QUESTION_COLUMNS
        .iter()
        .find(|(d, _, _)| *d == dimension)
        .cloned()
        .unwrap_or((dimension, dimension.column_prefix(), dimension.column_prefix()));
    let idx = table
        .find_column(&[question, alias])
        .context(MissingColumnSnafu {
            path: table.path.clone(),
            column: format!("{} (or {})", question, alias),
        })?;
    Ok(idx)
}

/// Reads the respondents of the month.
pub fn read_respondents(input: &PanelInput, month: Month) -> PanelResult<Vec<RespondentRecord>> {
    let path = data_path(input, month);
    require_file(
        &path,
        &format!(
            "the respondents export of panel {} for {} is expected here",
            input.panel,
            month.label()
        ),
    )?;
    let table = if is_excel(&path) {
        read_xlsx_table(&path, input.excel_worksheet_name.as_deref())?
    } else {
        read_csv_table(&path)?
    };

    let mut columns: Vec<(Dimension, usize)> = Vec::new();
    for dimension in Dimension::ALL {
        columns.push((dimension, question_index(&table, input, dimension)?));
    }
    let id_idx = table.find_column(&ID_COLUMNS);
    debug!("read_respondents: columns {:?} id {:?}", columns, id_idx);
    let default_id = make_default_id(&path);

    let mut res: Vec<RespondentRecord> = Vec::with_capacity(table.rows.len());
    for (lineno, row) in table.rows.iter() {
        let mut r = RespondentRecord {
            id: id_idx
                .and_then(|i| cell_value(row, i))
                .or_else(|| Some(default_id(*lineno))),
            ..RespondentRecord::default()
        };
        for (dimension, idx) in columns.iter() {
            r.set(*dimension, cell_value(row, *idx));
        }
        res.push(r);
    }
    info!(
        "read_respondents: {:?}: {} respondents",
        table.path,
        res.len()
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    fn june() -> Month {
        Month::new(2025, 6).unwrap()
    }

    fn input(dir: &Path) -> PanelInput {
        PanelInput {
            panel: Panel::Ms,
            provider: Provider::MsRespondents,
            directory: dir.to_path_buf(),
            file_name: None,
            excel_worksheet_name: None,
            columns: BTreeMap::new(),
        }
    }

    #[test]
    fn question_columns() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join("ms_data_202506.csv"),
            "Resp ID,Q1_Age,Q2_Gender,Q3_Personal_Income,Q4_Household_Income,Q5_Occupation,Q6_Employment,Q7_Province,Q8_Car_Num,Q9_Car_Owner,Extra\n\
             R1,34,ชาย,,,,,เชียงใหม่,1,ตนเอง,x\n\
             ,61, Female ,,,,,,,,\n",
        )
        .unwrap();
        let rs = read_respondents(&input(dir.path()), june()).unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs[0].id.as_deref(), Some("R1"));
        assert_eq!(rs[0].age.as_deref(), Some("34"));
        assert_eq!(rs[0].region.as_deref(), Some("เชียงใหม่"));
        assert_eq!(rs[0].car_owner.as_deref(), Some("ตนเอง"));
        assert_eq!(rs[1].id.as_deref(), Some("ms_data_202506.csv-00000003"));
        assert_eq!(rs[1].gender.as_deref(), Some("Female"));
        assert_eq!(rs[1].cars_at_home, None);
    }

    #[test]
    fn renamed_columns() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join("june.csv"),
            "Respondent_ID,Age,Gender,Personal_Income,Household_Income,Occupation,Employment_Status,Province,Number_of_Cars_at_Home,Where\n\
             7,25,Male,,,,,ภูเก็ต,2,บุตร\n",
        )
        .unwrap();
        let mut i = input(dir.path());
        i.file_name = Some("june.csv".to_string());
        assert!(matches!(
            *read_respondents(&i, june()).unwrap_err(),
            ProfilingError::MissingColumn { .. }
        ));
        i.columns.insert(
            Dimension::CarOwner,
            ColumnNames {
                label: Some("Where".to_string()),
                count: None,
            },
        );
        let rs = read_respondents(&i, june()).unwrap();
        assert_eq!(rs[0].id.as_deref(), Some("7"));
        assert_eq!(rs[0].cars_at_home.as_deref(), Some("2"));
        assert_eq!(rs[0].car_owner.as_deref(), Some("บุตร"));
    }

    #[test]
    fn export_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let i = input(dir.path());
        assert_eq!(data_path(&i, june()), dir.path().join("ms_data_202506.csv"));
        fs::write(dir.path().join("ms_data_202506.xlsx"), "").unwrap();
        assert_eq!(data_path(&i, june()), dir.path().join("ms_data_202506.xlsx"));
        assert!(is_excel(&data_path(&i, june())));
        assert!(matches!(
            *read_respondents(&i, Month::new(2025, 7).unwrap()).unwrap_err(),
            ProfilingError::MissingInputFile { .. }
        ));
    }
}
