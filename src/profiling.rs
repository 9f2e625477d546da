use log::{debug, info, warn};

use panel_profile::report::{self, Filter, Scope};
use panel_profile::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use text_diff::print_diff;

use crate::args::Args;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_ds;
mod io_ms;
mod io_summary;
mod io_xlsx;
mod report_writer;

use crate::profiling::config_reader::*;
use crate::profiling::io_common::require_file;

#[derive(Debug, Snafu)]
pub enum ProfilingError {
    #[snafu(display("Missing input file {path}: {hint}"))]
    MissingInputFile { path: String, hint: String },
    #[snafu(display("Error reading CSV file {path}"))]
    UnreadableCsv { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display(
        "Several worksheets found in {path}: the option excelWorksheetName must be provided"
    ))]
    AmbiguousWorksheet { path: String },
    #[snafu(display("{path}: line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("{path}: missing column {column}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("{path}: line {lineno}: invalid count {value:?}"))]
    BadCount {
        path: String,
        lineno: usize,
        value: String,
    },
    #[snafu(display("Malformed summary file {path}: line {lineno}: {reason}"))]
    MalformedSummary {
        path: String,
        lineno: usize,
        reason: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {reason}"))]
    InvalidConfig { reason: String },
    #[snafu(display("Error writing file {path}"))]
    Writing {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Could not lock the summary file with {path}"))]
    Locking {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid data"))]
    Profile { source: ProfileError },
    #[snafu(display("Difference detected between the summary {path} and the reference {reference}"))]
    ReferenceMismatch { path: String, reference: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ProfilingResult<T> = Result<T, ProfilingError>;
pub type PanelResult<T> = Result<T, Box<ProfilingError>>;

/// The steps of a run.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Step {
    Process,
    Merge,
    /// Process, then merge.
    All,
    Report,
}

impl Step {
    pub fn parse(s: &str) -> ProfilingResult<Step> {
        match s.trim().to_lowercase().as_str() {
            "process" => Ok(Step::Process),
            "merge" => Ok(Step::Merge),
            "all" => Ok(Step::All),
            "report" => Ok(Step::Report),
            x => whatever!(
                "Unknown step {:?}: expected one of process, merge, all, report",
                x
            ),
        }
    }
}

/// Reads the raw export of a panel for the month and writes its intermediate file.
///
/// Returns the summary row of the panel.
pub fn process_panel(config: &RunConfig, input: &PanelInput) -> PanelResult<SummaryRow> {
    let month = config.month;
    info!(
        "process_panel: panel {} month {} provider {:?} directory {:?}",
        input.panel, month, input.provider, input.directory
    );
    let aggregation = match input.provider {
        Provider::DsDimensionCounts => {
            let observations = io_ds::read_dimension_counts(input, month)?;
            aggregate_observations(input.panel, month, &observations).context(ProfileSnafu {})?
        }
        Provider::MsRespondents => {
            let respondents = io_ms::read_respondents(input, month)?;
            aggregate(input.panel, month, &respondents).context(ProfileSnafu {})?
        }
    };
    for (dimension, q) in aggregation.quality.dimensions.iter() {
        if q.excluded > 0 {
            debug!(
                "process_panel: {}: {} answers without a column",
                dimension, q.excluded
            );
        }
    }

    let out_path = config.intermediate_path(input.panel);
    io_summary::write_rows(&out_path, &[aggregation.row.clone()])?;
    info!(
        "process_panel: panel {}: {} respondents written to {:?}",
        input.panel,
        aggregation.row.total(),
        out_path
    );
    Ok(aggregation.row)
}

// Holds the lock file of the summary while it is alive.
struct SummaryLock {
    file: fs::File,
    path: PathBuf,
}

impl SummaryLock {
    fn acquire(summary_path: &Path) -> PanelResult<SummaryLock> {
        let mut name = summary_path.as_os_str().to_os_string();
        name.push(".lock");
        let path = PathBuf::from(name);
        let p = path.display().to_string();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context(WritingSnafu { path: p.clone() })?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .context(LockingSnafu { path: p.clone() })?;
        debug!("SummaryLock: waiting for {:?}", path);
        file.lock_exclusive().context(LockingSnafu { path: p })?;
        Ok(SummaryLock { file, path })
    }
}

impl Drop for SummaryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("SummaryLock: could not unlock {:?}: {}", self.path, e);
        }
    }
}

/// Merges the intermediate files of the month into the summary file.
///
/// The existing summary is read completely before anything is written. Concurrent
/// merges into the same summary wait for each other.
pub fn merge_into_summary(config: &RunConfig, panels: &[Panel]) -> PanelResult<SummaryTable> {
    let month = config.month;
    let mut batch: Vec<SummaryRow> = Vec::new();
    for panel in panels.iter() {
        let path = config.intermediate_path(*panel);
        require_file(
            &path,
            &format!(
                "run the process step for panel {} and month {} first",
                panel, month
            ),
        )?;
        batch.push(io_summary::read_intermediate(&path, *panel, month)?);
    }

    let summary_path = &config.summary_path;
    let _lock = SummaryLock::acquire(summary_path)?;
    let existing = if summary_path.is_file() {
        let table = io_summary::read_summary(summary_path)?;
        info!(
            "merge_into_summary: {} existing rows in {:?}",
            table.len(),
            summary_path
        );
        Some(table)
    } else {
        None
    };

    let table = merge(existing, month, batch, config.policy).context(ProfileSnafu {})?;
    io_summary::write_rows(summary_path, table.rows())?;
    info!(
        "merge_into_summary: {} rows written to {:?}",
        table.len(),
        summary_path
    );
    Ok(table)
}

/// Writes the report tables computed from the summary file.
pub fn run_report(
    config: &RunConfig,
    out_dir: &Path,
    year: Option<i32>,
    filter: Filter,
) -> PanelResult<Vec<PathBuf>> {
    let summary_path = &config.summary_path;
    require_file(summary_path, "run the merge step first")?;
    let table = io_summary::read_summary(summary_path)?;

    let year = match year.or_else(|| table.latest_month().map(|m| m.year())) {
        Some(y) => y,
        None => {
            warn!("run_report: the summary {:?} has no rows", summary_path);
            config.month.year()
        }
    };

    let mut written: Vec<PathBuf> = Vec::new();
    let scopes = [
        Scope::Panel(Panel::Ms),
        Scope::Panel(Panel::Ds),
        Scope::Combined,
    ];
    for scope in scopes {
        let comparison = report::monthly_comparison(&table, scope, year);
        written.push(report_writer::write_monthly_comparison(out_dir, &comparison)?);
    }
    written.push(report_writer::write_filtered_metrics(
        out_dir, &table, &filter,
    )?);

    if let Some(m) = filter.month {
        if !table.months().contains(&m) {
            warn!(
                "run_report: no data for {} in {:?}, months present: {:?}",
                m,
                summary_path,
                table.months()
            );
        }
    }
    let selection = filter.select(&table);
    match selection.month {
        Some(m) if !selection.is_empty() => {
            for dimension in Dimension::ALL {
                let distribution = report::distribution(&selection, dimension);
                written.push(report_writer::write_distribution(
                    out_dir,
                    &distribution,
                    filter.panel,
                    m,
                )?);
            }
        }
        _ => warn!("run_report: nothing selected, no distribution written"),
    }
    println!("{}", report_writer::render_overview(&selection));
    Ok(written)
}

fn check_reference(summary_path: &Path, reference_path: &str) -> PanelResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningFileSnafu {
        path: reference_path.to_string(),
    })?;
    let written = fs::read_to_string(summary_path).context(OpeningFileSnafu {
        path: summary_path.display().to_string(),
    })?;
    let reference_lines: Vec<&str> = reference.lines().map(|l| l.trim_end()).collect();
    let written_lines: Vec<&str> = written.lines().map(|l| l.trim_end()).collect();
    if reference_lines != written_lines {
        warn!("Found differences with the reference summary");
        print_diff(
            reference_lines.join("\n").as_str(),
            written_lines.join("\n").as_str(),
            "\n",
        );
        return Err(Box::new(ProfilingError::ReferenceMismatch {
            path: summary_path.display().to_string(),
            reference: reference_path.to_string(),
        }));
    }
    info!("check_reference: the summary matches {:?}", reference_path);
    Ok(())
}

fn parse_panels(names: &[String]) -> ProfilingResult<Vec<Panel>> {
    let mut res: Vec<Panel> = Vec::new();
    for n in names.iter() {
        let p = Panel::parse(n).context(ProfileSnafu {})?;
        if !res.contains(&p) {
            res.push(p);
        }
    }
    Ok(res)
}

/// Runs the steps requested on the command line.
pub fn run(args: &Args) -> PanelResult<()> {
    let step = Step::parse(&args.step)?;
    let config_p = Path::new(args.config.as_str());
    let config = read_config(config_p)?;
    debug!("config: {:?}", config);
    let root_p = match config_p.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let run_config = validate_config(&config, &root_p, args.month.as_deref())?;
    info!(
        "run: step {:?} month {} summary {:?}",
        step, run_config.month, run_config.summary_path
    );

    let selected = parse_panels(&args.panel)?;
    let inputs: Vec<&PanelInput> = run_config
        .inputs
        .iter()
        .filter(|i| selected.is_empty() || selected.contains(&i.panel))
        .collect();
    for p in selected.iter() {
        if !inputs.iter().any(|i| i.panel == *p) {
            return Err(Box::new(ProfilingError::InvalidConfig {
                reason: format!("panel {} is not described in the configuration", p),
            }));
        }
    }

    if step == Step::Process || step == Step::All {
        for input in inputs.iter() {
            process_panel(&run_config, input)?;
        }
    }
    if step == Step::Merge || step == Step::All {
        let panels: Vec<Panel> = inputs.iter().map(|i| i.panel).collect();
        merge_into_summary(&run_config, &panels)?;
    }
    if step == Step::Report {
        let out_dir = match &args.out {
            Some(o) => PathBuf::from(o),
            None => root_p.join("reports"),
        };
        let filter = Filter {
            panel: match &args.report_panel {
                Some(p) => Some(Panel::parse(p).context(ProfileSnafu {})?),
                None => None,
            },
            month: match &args.report_month {
                Some(m) => Some(Month::parse(m).context(ProfileSnafu {})?),
                None => None,
            },
        };
        let written = run_report(&run_config, &out_dir, args.year, filter)?;
        info!("run: {} report files written", written.len());
    }

    if let Some(reference) = &args.reference {
        check_reference(&run_config.summary_path, reference)?;
    }
    Ok(())
}
