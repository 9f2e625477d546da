use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::profiling::*;

pub const DEFAULT_SUMMARY_FILE: &str = "monthly_profiling_summary.csv";
pub const DEFAULT_PROCESSED_DIRECTORY: &str = "processed_data";

/// Overrides the names of the columns read for one question.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnNames {
    pub label: Option<String>,
    /// Only used by the pre-tabulated exports.
    pub count: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PanelSource {
    pub panel: String,
    pub provider: String,
    pub directory: String,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub columns: Option<BTreeMap<String, ColumnNames>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingConfig {
    pub month: String,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
    #[serde(rename = "processedDirectory")]
    pub processed_directory: Option<String>,
    #[serde(rename = "mergePolicy")]
    pub merge_policy: Option<String>,
    pub panels: Vec<PanelSource>,
}

/// The formats of the raw exports.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    /// One CSV file of (label, count) rows per question.
    DsDimensionCounts,
    /// One row per respondent, in CSV or Excel format.
    MsRespondents,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "ds_dimension_counts" => Some(Provider::DsDimensionCounts),
            "ms_respondents" => Some(Provider::MsRespondents),
            _ => None,
        }
    }
}

/// A validated panel source.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PanelInput {
    pub panel: Panel,
    pub provider: Provider,
    /// Resolved against the directory of the configuration file.
    pub directory: PathBuf,
    pub file_name: Option<String>,
    pub excel_worksheet_name: Option<String>,
    pub columns: BTreeMap<Dimension, ColumnNames>,
}

impl PanelInput {
    pub fn column_names(&self, dimension: Dimension) -> Option<&ColumnNames> {
        self.columns.get(&dimension)
    }
}

/// Everything a run needs, checked and with the paths resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunConfig {
    pub month: Month,
    pub summary_path: PathBuf,
    pub processed_dir: PathBuf,
    pub policy: MergePolicy,
    pub inputs: Vec<PanelInput>,
}

impl RunConfig {
    /// The file written by the process step for a panel.
    pub fn intermediate_path(&self, panel: Panel) -> PathBuf {
        self.processed_dir.join(format!(
            "temp_{}_data_{}.csv",
            panel.file_prefix(),
            self.month.code()
        ))
    }
}

pub fn read_config(path: &Path) -> PanelResult<ProfilingConfig> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path: p.clone() })?;
    let config: ProfilingConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path: p })?;
    Ok(config)
}

fn parse_policy(s: &str) -> ProfilingResult<MergePolicy> {
    match s {
        "replaceMonth" => Ok(MergePolicy::ReplaceMonth),
        "replacePanelMonth" => Ok(MergePolicy::ReplacePanelMonth),
        x => InvalidConfigSnafu {
            reason: format!(
                "unknown merge policy {:?}, expected replaceMonth or replacePanelMonth",
                x
            ),
        }
        .fail(),
    }
}

fn validate_source(source: &PanelSource, root: &Path) -> ProfilingResult<PanelInput> {
    let panel = Panel::parse(&source.panel).context(ProfileSnafu {})?;
    let provider = Provider::parse(&source.provider).context(InvalidConfigSnafu {
        reason: format!(
            "panel {}: unknown provider {:?}, expected ds_dimension_counts or ms_respondents",
            panel, source.provider
        ),
    })?;
    let mut columns: BTreeMap<Dimension, ColumnNames> = BTreeMap::new();
    if let Some(cols) = &source.columns {
        for (name, names) in cols.iter() {
            let dimension = Dimension::parse_name(name).context(InvalidConfigSnafu {
                reason: format!("panel {}: unknown question {:?} in columns", panel, name),
            })?;
            columns.insert(dimension, names.clone());
        }
    }
    Ok(PanelInput {
        panel,
        provider,
        directory: root.join(&source.directory),
        file_name: source.file_name.clone().filter(|s| !s.trim().is_empty()),
        excel_worksheet_name: source
            .excel_worksheet_name
            .clone()
            .filter(|s| !s.trim().is_empty()),
        columns,
    })
}

/// Checks the configuration and resolves its paths against `root`.
///
/// `month_override` takes the place of the configured month when provided.
pub fn validate_config(
    config: &ProfilingConfig,
    root: &Path,
    month_override: Option<&str>,
) -> ProfilingResult<RunConfig> {
    let month = Month::parse(month_override.unwrap_or(config.month.as_str()))
        .context(ProfileSnafu {})?;
    let policy = match &config.merge_policy {
        Some(s) => parse_policy(s)?,
        None => MergePolicy::DEFAULT,
    };
    ensure!(
        !config.panels.is_empty(),
        InvalidConfigSnafu {
            reason: "no panel sources provided"
        }
    );
    let mut inputs: Vec<PanelInput> = Vec::new();
    for source in config.panels.iter() {
        let input = validate_source(source, root)?;
        ensure!(
            !inputs.iter().any(|i| i.panel == input.panel),
            InvalidConfigSnafu {
                reason: format!("panel {} is listed more than once", input.panel)
            }
        );
        inputs.push(input);
    }
    let summary_file = config
        .summary_file
        .clone()
        .unwrap_or_else(|| DEFAULT_SUMMARY_FILE.to_string());
    let processed = config
        .processed_directory
        .clone()
        .unwrap_or_else(|| DEFAULT_PROCESSED_DIRECTORY.to_string());
    Ok(RunConfig {
        month,
        summary_path: root.join(summary_file),
        processed_dir: root.join(processed),
        policy,
        inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ProfilingConfig {
        serde_json::from_str(s).unwrap()
    }

    const FULL: &str = r#"{
  "month": "2025-06-01",
  "summaryFile": "out/summary.csv",
  "processedDirectory": "tmp",
  "mergePolicy": "replacePanelMonth",
  "panels": [
    { "panel": "ds", "provider": "ds_dimension_counts", "directory": "data/ds_data",
      "columns": { "employment": { "label": "Employment Status", "count": "Region Area Count" } } },
    { "panel": "MS", "provider": "ms_respondents", "directory": "data/ms_data",
      "fileName": "ms_data_202506.xlsx", "excelWorksheetName": "Sheet1" }
  ]
}"#;

    #[test]
    fn full_config() {
        let c = parse(FULL);
        let rc = validate_config(&c, Path::new("/runs"), None).unwrap();
        assert_eq!(rc.month, Month::new(2025, 6).unwrap());
        assert_eq!(rc.policy, MergePolicy::ReplacePanelMonth);
        assert_eq!(rc.summary_path, PathBuf::from("/runs/out/summary.csv"));
        assert_eq!(
            rc.intermediate_path(Panel::Ms),
            PathBuf::from("/runs/tmp/temp_ms_data_202506.csv")
        );
        assert_eq!(rc.inputs.len(), 2);
        let ds = &rc.inputs[0];
        assert_eq!(ds.panel, Panel::Ds);
        assert_eq!(ds.provider, Provider::DsDimensionCounts);
        assert_eq!(ds.directory, PathBuf::from("/runs/data/ds_data"));
        assert_eq!(
            ds.column_names(Dimension::Employment).unwrap().count.as_deref(),
            Some("Region Area Count")
        );
        let ms = &rc.inputs[1];
        assert_eq!(ms.excel_worksheet_name.as_deref(), Some("Sheet1"));
    }

    #[test]
    fn defaults_and_override() {
        let c = parse(
            r#"{"month": "2025-06-01", "panels": [
                 {"panel": "MS", "provider": "ms_respondents", "directory": "."}]}"#,
        );
        let rc = validate_config(&c, Path::new("r"), Some("2025-07")).unwrap();
        assert_eq!(rc.month, Month::new(2025, 7).unwrap());
        assert_eq!(rc.policy, MergePolicy::ReplaceMonth);
        assert_eq!(
            rc.summary_path,
            PathBuf::from("r/monthly_profiling_summary.csv")
        );
        assert_eq!(
            rc.intermediate_path(Panel::Ms),
            PathBuf::from("r/processed_data/temp_ms_data_202507.csv")
        );
    }

    #[test]
    fn rejects_invalid_configs() {
        let root = Path::new(".");
        let bad = [
            r#"{"month": "2025-13-01", "panels": [{"panel": "MS", "provider": "ms_respondents", "directory": "."}]}"#,
            r#"{"month": "2025-06-01", "panels": []}"#,
            r#"{"month": "2025-06-01", "panels": [{"panel": "XS", "provider": "ms_respondents", "directory": "."}]}"#,
            r#"{"month": "2025-06-01", "panels": [{"panel": "MS", "provider": "ess", "directory": "."}]}"#,
            r#"{"month": "2025-06-01", "mergePolicy": "upsert", "panels": [{"panel": "MS", "provider": "ms_respondents", "directory": "."}]}"#,
            r#"{"month": "2025-06-01", "panels": [{"panel": "MS", "provider": "ms_respondents", "directory": "."},
                                                   {"panel": "ms", "provider": "ms_respondents", "directory": "b"}]}"#,
            r#"{"month": "2025-06-01", "panels": [{"panel": "DS", "provider": "ds_dimension_counts", "directory": ".",
                                                   "columns": {"shoe_size": {"label": "Size"}}}]}"#,
        ];
        for s in bad.iter() {
            let c = parse(s);
            assert!(validate_config(&c, root, None).is_err(), "{}", s);
        }
    }

    #[test]
    fn unreadable_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("run.json");
        assert!(matches!(
            *read_config(&p).unwrap_err(),
            ProfilingError::OpeningFile { .. }
        ));
        std::fs::write(&p, "{ not json").unwrap();
        assert!(matches!(
            *read_config(&p).unwrap_err(),
            ProfilingError::ParsingConfig { .. }
        ));
    }
}
