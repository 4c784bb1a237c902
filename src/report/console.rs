use colored::Colorize;
use std::path::PathBuf;

use crate::{
    error::Result,
    report::{Report, ReportSink, COLUMNS},
    utils,
};

const WIDTHS: [usize; 9] = [12, 16, 12, 14, 14, 14, 12, 14, 14];

/// Prints the report as a table on stdout
pub struct ConsoleSink {
    show_summary: bool,
}

impl ConsoleSink {
    pub fn new(show_summary: bool) -> Self {
        Self { show_summary }
    }

    fn table_width() -> usize {
        WIDTHS.iter().sum::<usize>() + 2 * (WIDTHS.len() - 1)
    }
}

impl ReportSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn render(&self, report: &Report) -> Result<Option<PathBuf>> {
        let width = Self::table_width();

        println!("\n{}", report.heading().cyan().bold());
        utils::print_table_border(width);
        utils::print_table_row(&COLUMNS, &WIDTHS);
        utils::print_table_border(width);

        for row in report.rows() {
            utils::print_table_row(
                &[
                    &row.case_id,
                    &row.category,
                    &row.ntp_date,
                    &utils::format_money(row.ntp_amount),
                    &row.structure_date,
                    &utils::format_money(row.structure_amount),
                    &row.final_date,
                    &utils::format_money(row.final_amount),
                    &utils::format_money(row.total),
                ],
                &WIDTHS,
            );
        }
        utils::print_table_border(width);

        let totals = report.totals();
        println!("{}", "Totals:".bold());
        println!("  NTP:        {}", utils::format_money_colored(totals.ntp));
        println!("  Structure:  {}", utils::format_money_colored(totals.structure));
        println!("  Final:      {}", utils::format_money_colored(totals.final_amount));
        println!("  Total:      {}", utils::format_money_colored(totals.total).bold());

        if self.show_summary {
            report.run.summary.print_summary();
        }

        Ok(None)
    }
}
