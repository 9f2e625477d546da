//! The canonical layout of the monthly summary table.
//!
//! Every row of the summary table has exactly these columns, in this order. The
//! two key columns come first, followed by the total and one count column per
//! category of each dimension.

use crate::config::*;

pub const PANEL_COLUMN: &str = "Panel_Source";
pub const MONTH_COLUMN: &str = "Collected_Month";
pub const TOTAL_COLUMN: &str = "Total_Respondents_Count";

pub const COLUMNS: [&str; 66] = [
    PANEL_COLUMN,
    MONTH_COLUMN,
    TOTAL_COLUMN,
    "Gender_Male_Count",
    "Gender_Female_Count",
    "Age_18_19_Count",
    "Age_20_29_Count",
    "Age_30_39_Count",
    "Age_40_49_Count",
    "Age_50_59_Count",
    "Age_60_69_Count",
    "Age_70_99_Count",
    "SES_Personal_A_Count",
    "SES_Personal_B_Plus_Count",
    "SES_Personal_B_Count",
    "SES_Personal_C_Plus_Count",
    "SES_Personal_C_Count",
    "SES_Personal_D_Count",
    "SES_Personal_E_Count",
    "SES_Personal_Unspecified_Count",
    "SES_Household_A_Count",
    "SES_Household_B_Plus_Count",
    "SES_Household_B_Count",
    "SES_Household_C_Plus_Count",
    "SES_Household_C_Count",
    "SES_Household_D_Count",
    "SES_Household_E_Count",
    "SES_Household_Unspecified_Count",
    "Occupation_Government_Count",
    "Occupation_Professional_Count",
    "Occupation_Commercial_Service_Count",
    "Occupation_Student_Count",
    "Occupation_General_Labor_Count",
    "Occupation_Unemployed_Count",
    "Occupation_Housewife_Count",
    "Occupation_Others_Count",
    "Occupation_Unspecified_Count",
    "Employment_Employed_Someone_Else_More_30_Hrs_Count",
    "Employment_Employed_Someone_Else_Less_30_Hrs_Count",
    "Employment_Self_Employed_Count",
    "Employment_Not_Employed_Looking_Count",
    "Employment_Student_Count",
    "Employment_Housewife_Count",
    "Employment_Not_Employed_Other_Count",
    "Employment_Unspecified_Count",
    "Region_Bangkok_Metropolitan_Count",
    "Region_Central_Count",
    "Region_Northeast_Count",
    "Region_North_Count",
    "Region_East_Count",
    "Region_West_Count",
    "Region_South_Count",
    "Region_Unspecified_Count",
    "Cars_At_Home_0_Count",
    "Cars_At_Home_1_Count",
    "Cars_At_Home_2_Count",
    "Cars_At_Home_3_Or_More_Count",
    "Cars_At_Home_Unspecified_Count",
    "Car_Owner_Yourself_Count",
    "Car_Owner_Spouse_Count",
    "Car_Owner_Parent_Count",
    "Car_Owner_Child_Count",
    "Car_Owner_Grandparents_Count",
    "Car_Owner_Brothers_Sisters_Count",
    "Car_Owner_Others_Count",
    "Car_Owner_Dont_Know_Count",
];

pub fn columns() -> &'static [&'static str] {
    &COLUMNS
}

/// The columns that hold counts: everything after the two key columns.
pub fn count_columns() -> &'static [&'static str] {
    &COLUMNS[2..]
}

pub fn count_index(column: &str) -> Option<usize> {
    count_columns().iter().position(|c| *c == column)
}

/// The column a category is counted in, if it has one.
pub fn category_column(dimension: Dimension, category: Category) -> Option<String> {
    category
        .suffix()
        .map(|s| format!("{}_{}_Count", dimension.column_prefix(), s))
}

/// The count columns of a dimension, in schema order.
pub fn dimension_columns(dimension: Dimension) -> Vec<String> {
    dimension
        .categories()
        .iter()
        .filter_map(|c| category_column(dimension, *c))
        .collect()
}

/// One row of the summary table: the counts of a panel for a month.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SummaryRow {
    pub panel: Panel,
    pub month: Month,
    counts: Vec<u64>,
}

impl SummaryRow {
    pub fn zeroed(panel: Panel, month: Month) -> SummaryRow {
        SummaryRow {
            panel,
            month,
            counts: vec![0; count_columns().len()],
        }
    }

    /// Builds a row from named counts.
    ///
    /// Columns of the schema that are not provided are set to 0. The names that
    /// are not part of the schema are returned alongside the row and dropped.
    pub fn reindexed<S, I>(panel: Panel, month: Month, pairs: I) -> (SummaryRow, Vec<String>)
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, u64)>,
    {
        let mut row = SummaryRow::zeroed(panel, month);
        let mut unknown: Vec<String> = Vec::new();
        for (name, value) in pairs {
            if !row.set(name.as_ref(), value) {
                unknown.push(name.as_ref().to_string());
            }
        }
        (row, unknown)
    }

    pub fn key(&self) -> (Panel, Month) {
        (self.panel, self.month)
    }

    /// The counts, aligned with `count_columns()`.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn get(&self, column: &str) -> Option<u64> {
        count_index(column).map(|i| self.counts[i])
    }

    /// Sets a count. Returns false if the column is not a count column.
    pub fn set(&mut self, column: &str, value: u64) -> bool {
        match count_index(column) {
            Some(i) => {
                self.counts[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts[0]
    }

    /// The count of a category, 0 for the categories without a column.
    pub fn count_of(&self, dimension: Dimension, category: Category) -> u64 {
        category_column(dimension, category)
            .and_then(|c| self.get(&c))
            .unwrap_or(0)
    }

    /// The sum of the columns of a dimension.
    pub fn dimension_total(&self, dimension: Dimension) -> u64 {
        dimension_columns(dimension)
            .iter()
            .filter_map(|c| self.get(c))
            .sum()
    }

    /// The cell values in schema order, as written to the summary file.
    pub fn cells(&self) -> Vec<String> {
        let mut res = vec![self.panel.to_string(), self.month.to_string()];
        res.extend(self.counts.iter().map(|c| c.to_string()));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn column_layout() {
        assert_eq!(columns().len(), 66);
        assert_eq!(count_columns().len(), 64);
        assert_eq!(count_columns()[0], TOTAL_COLUMN);
        let unique: HashSet<&str> = columns().iter().cloned().collect();
        assert_eq!(unique.len(), 66);
        assert!(count_columns().iter().all(|c| c.ends_with("_Count")));
    }

    #[test]
    fn every_category_column_is_in_schema() {
        let mut seen = 1; // total
        for d in Dimension::ALL {
            for c in dimension_columns(d) {
                assert!(count_index(&c).is_some(), "missing column {}", c);
                seen += 1;
            }
        }
        assert_eq!(seen, count_columns().len());
    }

    #[test]
    fn schema_order_follows_dimensions() {
        let mut expected: Vec<String> = vec![TOTAL_COLUMN.to_string()];
        for d in Dimension::ALL {
            expected.extend(dimension_columns(d));
        }
        let actual: Vec<String> = count_columns().iter().map(|s| s.to_string()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn sinks_without_column() {
        assert_eq!(
            category_column(Dimension::Gender, Category::Gender(Gender::Unspecified)),
            None
        );
        assert_eq!(
            category_column(Dimension::Age, Category::Age(AgeBand::Unspecified)),
            None
        );
        assert_eq!(
            category_column(Dimension::CarOwner, Category::CarOwner(CarOwnerRelation::DontKnow)),
            Some("Car_Owner_Dont_Know_Count".to_string())
        );
    }

    #[test]
    fn reindexed_fills_and_reports() {
        let month = Month::new(2025, 6).unwrap();
        let (row, unknown) = SummaryRow::reindexed(
            Panel::Ds,
            month,
            vec![("Gender_Male_Count", 3), ("Favorite_Color_Count", 2)],
        );
        assert_eq!(row.get("Gender_Male_Count"), Some(3));
        assert_eq!(row.get("Gender_Female_Count"), Some(0));
        assert_eq!(row.get("Favorite_Color_Count"), None);
        assert_eq!(unknown, vec!["Favorite_Color_Count".to_string()]);
        let cells = row.cells();
        assert_eq!(cells.len(), 66);
        assert_eq!(cells[0], "DS");
        assert_eq!(cells[1], "2025-06-01");
    }
}
