use clap::Parser;

/// This is a voting kiosk: voters enter their ID, vote once, and may look at the results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the kiosk (vote file, candidates, admin code).
    /// For more information about the file format, read the documentation of the kiosk_core::manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, default votes.csv) The file in which the votes are recorded. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// (list of names or not specified) The candidates on the ballot, in display order. Defaults to John and Jane.
    #[clap(long, value_parser)]
    pub candidates: Option<Vec<String>>,

    /// If passed as an argument, prints the current results and exits instead of starting the kiosk.
    #[clap(long, takes_value = false)]
    pub results: bool,

    /// (file path, 'stdout' or empty) If specified with --results, the summary of the results will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, a vote file that cannot be read is treated as empty instead of stopping
    /// the kiosk. The file is not modified until the next vote is appended to it.
    #[clap(long, takes_value = false)]
    pub ignore_corrupt_store: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
