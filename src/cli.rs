use clap::Parser;
use std::path::PathBuf;

use crate::report::OutputFormat;
use crate::scoring::scanner::DEFAULT_STRIDE;

#[derive(Parser, Debug)]
#[command(name = "wordspot", about = "Spot spoken query words inside recorded sentences")]
pub struct Cli {
    /// Directory of sentence recordings to search
    pub sentences: PathBuf,

    /// Directory of query word recordings
    pub queries: PathBuf,

    /// Score every Nth target frame
    #[arg(short, long, default_value_t = DEFAULT_STRIDE)]
    pub stride: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Display label for a file, as FILE=LABEL (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Config file (defaults to ./wordspot.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
