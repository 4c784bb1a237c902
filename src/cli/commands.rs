use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use payout_report::config::OutputFormat;
use payout_report::pipeline::WindowOverride;

#[derive(Parser)]
#[command(name = "payout")]
#[command(about = "Milestone payout report from a case sheet snapshot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    
    /// Path to configuration file (defaults to config/default.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Reporting window for this run, replacing the configured one
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// First day of a closed-interval window (YYYY-MM-DD)
    #[arg(long, requires = "end", conflicts_with = "before_month")]
    pub start: Option<NaiveDate>,
    
    /// Last day of a closed-interval window, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
    
    /// Exclusive month bound (YYYY-MM); dates must fall in an earlier month
    #[arg(long, value_name = "YYYY-MM")]
    pub before_month: Option<String>,
}

impl From<WindowArgs> for WindowOverride {
    fn from(args: WindowArgs) -> Self {
        Self {
            start: args.start,
            end: args.end,
            before_month: args.before_month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the payout report and render it
    Run {
        /// Snapshot file (sheet export or array of rows)
        #[arg(short, long)]
        source: Option<String>,
        
        #[command(flatten)]
        window: WindowArgs,
        
        /// Output formats; repeat for several (defaults to the configured list)
        #[arg(short, long, value_enum)]
        format: Vec<OutputFormat>,
        
        /// Directory for written reports
        #[arg(long)]
        out_dir: Option<String>,
        
        /// Do not record this run in the history database
        #[arg(long)]
        no_history: bool,
        
        /// Show the run summary after the table
        #[arg(short, long)]
        verbose: bool,
    },
    
    /// Explain why a case is or is not in the report
    Explain {
        /// Case ID as it appears in the sheet
        case_id: String,
        
        /// Snapshot file (sheet export or array of rows)
        #[arg(short, long)]
        source: Option<String>,
        
        #[command(flatten)]
        window: WindowArgs,
    },
    
    /// Show previously generated runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        
        /// Output format
        #[arg(short, long, value_enum, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,
    },
    
    /// Initialize the history database and print the effective configuration
    Init,
}
