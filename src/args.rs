use clap::Parser;

/// This is the monthly profiling program for the survey panels.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the run: month, panels, input directories and summary file.
    /// For more information about the file format, read the documentation of the panel_profile::manual module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (default all) The step to run: 'process', 'merge', 'all' (process then merge) or 'report'.
    #[clap(short, long, value_parser, default_value = "all")]
    pub step: String,

    /// (YYYY-MM or YYYY-MM-DD, optional) If specified, overrides the month of the configuration.
    #[clap(short, long, value_parser)]
    pub month: Option<String>,

    /// (DS or MS, repeatable) If specified, only these panels are processed and merged.
    #[clap(short, long, value_parser)]
    pub panel: Vec<String>,

    /// (file path) A reference summary file in CSV format. If provided, panelprof will
    /// check that the written summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory, default 'reports' next to the configuration) Where the report step writes its tables.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default: the year of the latest month) The year of the monthly comparison tables.
    #[clap(long, value_parser)]
    pub year: Option<i32>,

    /// (DS or MS, optional) Restricts the filtered metrics table of the report to one panel.
    #[clap(long, value_parser)]
    pub report_panel: Option<String>,

    /// (YYYY-MM or YYYY-MM-DD, optional) The month of the filtered metrics table. The latest month by default.
    #[clap(long, value_parser)]
    pub report_month: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
