mod cli;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, HistoryFormat, WindowArgs};
use colored::*;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use payout_report::{
    config::{Config, OutputFormat},
    engine::{normalize_date, CaseOutcome, Milestone, PayoutEngine},
    error,
    pipeline::{self, WindowOverride},
    report,
    storage::{Database, RunRecord},
    utils,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payout_report=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { source, window, format, out_dir, no_history, verbose } => {
            info!("Generating payout report...");
            let options = RunOptions { formats: format, out_dir, no_history, verbose };
            run_report(&config, source.as_deref(), window, options).await
        }

        Commands::Explain { case_id, source, window } => {
            explain_case(&config, &case_id, source.as_deref(), window).await
        }

        Commands::History { limit, format } => show_history(&config, limit, format),

        Commands::Init => initialize(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

struct RunOptions {
    formats: Vec<OutputFormat>,
    out_dir: Option<String>,
    no_history: bool,
    verbose: bool,
}

async fn run_report(
    config: &Config,
    source: Option<&str>,
    window: WindowArgs,
    options: RunOptions,
) -> error::Result<()> {
    let window = pipeline::resolve_window(&config.report, &WindowOverride::from(window))?;
    let source = pipeline::resolve_source(config, source)?;

    println!("{}", format!("Reporting window: {}", window).cyan());

    let report = pipeline::generate_report(
        &config.report,
        window,
        &source,
        Utc::now().date_naive(),
    )
    .await?;

    let formats = if options.formats.is_empty() {
        config.output.formats.clone()
    } else {
        options.formats
    };
    let out_dir = options.out_dir.unwrap_or_else(|| config.output.dir.clone());
    let file_stem = config
        .output
        .file_stem
        .clone()
        .unwrap_or_else(|| report::default_file_stem(&report.run));

    let sinks = report::build_sinks(&formats, Path::new(&out_dir), &file_stem, options.verbose);
    let written = report::render_all(&sinks, &report)?;

    for path in &written {
        println!("{} {}", "✓ Written:".green(), path.display());
    }

    if options.no_history {
        info!("Skipping run history");
        return Ok(());
    }

    let record = RunRecord::from_run(&report.run, &source.path().display().to_string(), Utc::now());
    match Database::new(&config.database.path).and_then(|db| db.save_run(&record)) {
        Ok(id) => info!("Run {} saved to history", id),
        // the report itself is already written
        Err(e) => warn!("Failed to record run history: {}", e),
    }

    Ok(())
}

async fn explain_case(
    config: &Config,
    case_id: &str,
    source: Option<&str>,
    window: WindowArgs,
) -> error::Result<()> {
    let window = pipeline::resolve_window(&config.report, &WindowOverride::from(window))?;
    let source = pipeline::resolve_source(config, source)?;
    let engine = PayoutEngine::with_window(&config.report, window)?;
    let records = pipeline::load_records(&source, &config.report).await?;

    for (record, outcome) in pipeline::explain_case(&engine, &records, case_id)? {
        println!("\n{}", format!("=== Case {} ===", record.case_id()).cyan().bold());
        println!("Award type:    {}", record.award_type());
        println!("Stage status:  {}", record.stage_status());
        println!("Window:        {}", engine.window());

        let eligibility = engine.filter().check(&record);
        if let Some(flags) = eligibility.flags() {
            println!("\nMilestones:");
            for milestone in Milestone::ALL {
                let raw = record.date_cell(milestone).to_display();
                let fallback = match milestone {
                    Milestone::Final if normalize_date(record.date_cell(milestone)).is_none() => {
                        record.final_date_fallback.to_display()
                    }
                    _ => String::new(),
                };
                let status = if flags.in_window[milestone] {
                    "in window".green()
                } else {
                    "outside".dimmed()
                };
                println!(
                    "  {:<10} raw: {:<12} fallback: {:<12} date: {:<10}  {}",
                    milestone.label(),
                    raw,
                    fallback,
                    utils::format_date(flags.dates[milestone]),
                    status
                );
            }
        }

        let verdict = match &outcome {
            CaseOutcome::Excluded { .. } | CaseOutcome::NoMilestoneInWindow => {
                format!("Excluded: {}", eligibility.reason()).red()
            }
            CaseOutcome::UnknownCategory { award_type } => {
                format!("Excluded: unrecognized award type '{}'", award_type).red()
            }
            CaseOutcome::NoPaidMilestone { category } => {
                format!("Excluded: no milestone paid under the {} policy is in window", category).red()
            }
            CaseOutcome::Included(_) => format!("Included ({})", eligibility.reason()).green(),
        };
        println!("\nResult: {}", verdict);

        if let Some(case) = outcome.computation() {
            for milestone in Milestone::ALL {
                println!(
                    "  {:<10} {:<12} {}",
                    milestone.label(),
                    utils::format_date(case.date(milestone)),
                    utils::format_money_colored(case.amount(milestone))
                );
            }
            println!("  {:<10} {:<12} {}", "Total", "", utils::format_money_colored(case.total()).bold());
        }
    }

    Ok(())
}

fn show_history(config: &Config, limit: usize, format: HistoryFormat) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let history = db.get_run_history(Some(limit))?;

    if format == HistoryFormat::Json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("{}", "No report runs recorded yet".yellow());
        return Ok(());
    }

    println!("{}", "=== Report Run History ===".cyan().bold());
    utils::print_table_border(110);
    utils::print_table_row(
        &["Generated", "Window", "Records", "Cases", "Total", "Source"],
        &[22, 28, 8, 6, 16, 24],
    );
    utils::print_table_border(110);

    for run in history {
        utils::print_table_row(
            &[
                &run.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                &run.window,
                &run.records_read.to_string(),
                &run.case_count.to_string(),
                &utils::format_money(run.grand_total),
                &run.source,
            ],
            &[22, 28, 8, 6, 16, 24],
        );
    }
    utils::print_table_border(110);

    Ok(())
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing payout report...".green());
    let db = Database::new(&config.database.path)?;
    println!("{}", format!("✓ History database ready ({} runs)", db.run_count()?).green());

    // validates window, weights and categories
    let engine = PayoutEngine::from_config(&config.report)?;
    println!("{}", "✓ Configuration valid".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Window:       {}", engine.window());
    println!("  Source:       {}", config.source.path.as_deref().unwrap_or("(pass --source)"));
    println!("  Output dir:   {}", config.output.dir);
    println!("  Database:     {}", config.database.path);

    println!("\n{}", "Effective configuration (TOML):".cyan());
    println!("{}", config.to_toml()?);

    println!("{}", "Ready to use! Try running:".cyan());
    println!("  {} to build the report", "payout run --source sheet.json".yellow());
    println!("  {} to see why a case is missing", "payout explain <CASE_ID> --source sheet.json".yellow());
    println!("  {} to list previous runs", "payout history".yellow());
    Ok(())
}
