use clap::{Parser, ValueEnum};
use harvest_page::filter::ViewFilter;

#[derive(Parser, Debug)]
#[command(name = "harvest-page")]
#[command(about = "Extracts and classifies links and email addresses from a web page")]
#[command(version)]
pub struct Args {
    /// Page URL to scan (or a local HTML file path with --from-file)
    pub target: String,

    /// What to extract
    #[arg(short, long, value_enum, default_value_t = ExtractTarget::Links)]
    pub extract: ExtractTarget,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write the output to this file instead of stdout
    #[arg(long)]
    pub out_file: Option<std::path::PathBuf>,

    /// Write the output to an auto-named timestamped file
    #[arg(long)]
    pub save: bool,

    /// WebDriver server URL
    #[arg(long, default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Parse a local HTML file instead of driving a browser
    #[arg(long)]
    pub from_file: bool,

    /// Case-insensitive filter over URLs, labels and addresses
    #[arg(short, long)]
    pub query: Option<String>,

    /// Only include records reachable by scrolling
    #[arg(long)]
    pub visible_only: bool,

    /// Exclude same-host links
    #[arg(long)]
    pub no_internal: bool,

    /// Exclude cross-host links
    #[arg(long)]
    pub no_external: bool,

    /// Highlight this link id on the page after scanning (live mode only)
    #[arg(long)]
    pub highlight: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExtractTarget {
    Links,
    Emails,
    All,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Build the result-view filter from command-line switches
pub fn build_filter(args: &Args) -> ViewFilter {
    ViewFilter {
        query: args.query.clone().unwrap_or_default(),
        show_internal: !args.no_internal,
        show_external: !args.no_external,
        visible_only: args.visible_only,
    }
}
