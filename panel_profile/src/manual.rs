/*!

This is the long-form manual for `panel_profile` and `panelprof`.

## Monthly run

A monthly run has two steps:

1. `process`: each panel's raw export for the month is read, every answer is
   mapped to its canonical category and the counts are written to an
   intermediate file `temp_<panel>_data_<YYYYMM>.csv` in the processed
   directory.
2. `merge`: the intermediate files of the month are merged into the cumulative
   summary file, `monthly_profiling_summary.csv` by default.

`panelprof --config run.json` runs both steps. `--step process` or
`--step merge` runs only one of them, and `--step report` writes the report
tables from the existing summary.

## Input formats

### DS panel (`ds_dimension_counts`)

The DS panel is delivered pre-tabulated: one CSV file per question, named
`ds_<question>_<YYYYMM>.csv`, with a label column and a count column:

| question            | label column            | count column        |
|---------------------|-------------------------|---------------------|
| `gender`            | `Gender`                | `Count`             |
| `age`               | `Age`                   | `N`                 |
| `personal_income`   | `Personal Income`       | `Count`             |
| `household_income`  | `Household income`      | `Count`             |
| `occupation`        | `Occupation Category`   | `Count`             |
| `employment`        | `Employment Status`     | `Region Area Count` |
| `region`            | `Region Area`           | `Region Area Count` |
| `cars`              | `Number of cars at home`| `Count`             |
| `car_owner`         | `Owner of car`          | `Count`             |

The column names can be changed for each question in the configuration.

### MS panel (`ms_respondents`)

The MS panel is delivered as one row per respondent, in CSV or Excel format,
named `ms_data_<YYYYMM>.csv` (or `.xlsx`). The questions are read from the
columns `Q1_Age`, `Q2_Gender`, `Q3_Personal_Income`, `Q4_Household_Income`,
`Q5_Occupation`, `Q6_Employment`, `Q7_Province`, `Q8_Car_Num` and
`Q9_Car_Owner`. The short names `Age`, `Gender`, `Personal_Income`,
`Household_Income`, `Occupation`, `Employment_Status`, `Province`,
`Number_of_Cars_at_Home` and `Owner_of_Car` are also accepted.

## Categories

Answers are compared after trimming, lowercasing and collapsing whitespace.
The first rule of the panel's table that matches decides the category. An
answer that matches nothing is counted in the fallback category of its
question (`Unspecified`, or `Dont_Know` for the car owner) and is reported as
unmapped in the logs.

Two fallback categories have no column: a gender or an age that cannot be
classified is not counted in its question. Such respondents still count in
`Total_Respondents_Count`, which is the number of gender answers.

The two panels do not use the same income brackets. In particular the DS
bracket `100,000 - 149,999 THB` is counted as `B+` while the MS bracket
`100,000 - 200,000 THB` is counted as `A`.

## Merge policy

With the default policy `replaceMonth`, every row of the processed month is
removed from the summary before the new rows are added, including the rows of
panels that are not part of the run. Re-running only one panel for a month
therefore drops the other panel's row for that month. The policy
`replacePanelMonth` only replaces the rows of the panels being merged.

Rows of other months are never modified. The summary is read completely
before anything is written: if it cannot be read, nothing is written.

## Configuration

```json
{
  "month": "2025-06-01",
  "summaryFile": "monthly_profiling_summary.csv",
  "processedDirectory": "processed_data",
  "mergePolicy": "replaceMonth",
  "panels": [
    { "panel": "DS", "provider": "ds_dimension_counts", "directory": "data/ds_data" },
    { "panel": "MS", "provider": "ms_respondents", "directory": "data/ms_data" }
  ]
}
```

Paths are relative to the directory of the configuration file.

## Reports

`--step report` writes to the `--out` directory:
- `analytics_data_<panel>_<month>.csv` the metrics of the filtered rows
- `meow_monthly_trends_<year>.csv`, `asian_monthly_trends_<year>.csv` and
  `combined_monthly_trends_<year>.csv` the month by month comparison of the
  metrics
- `distribution_<dimension>_<panel>_<dd-mm-YYYY>.csv` one file per dimension:
  the count and the share of every category for the selected month, per panel
  and for all panels together. The unspecified categories are left out and the
  shares are computed over the categories shown.

The metrics are computed from the summary each time:
- Overall: `Total_Respondents_Count`
- Silver Gen: respondents aged 60 and over
- Auto: respondents with at least one car at home
- UPC: respondents in a known region outside Greater Bangkok

*/
